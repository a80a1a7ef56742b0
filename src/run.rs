//! Run orchestration: source → split → extract → parse → sheets.
//!
//! A run processes exactly one document, one batch at a time. The first
//! failing batch aborts the run. Sheets written by earlier batches stay in
//! place and stale-sheet cleanup is skipped, so a failed run never deletes
//! anything.

use crate::config::RunConfig;
use crate::error::Pdf2SheetsError;
use crate::output::{BatchReport, DocumentPlan, RunReport};
use crate::pipeline::extract::Extractor;
use crate::pipeline::normalize::clean_markdown;
use crate::pipeline::pages::parse_pages;
use crate::pipeline::split::{batch_ranges, bind_pdfium, load_document, PageBatch, PageBatches};
use crate::sheets::{Reconciler, SheetStore};
use crate::source::{DocumentSource, FileRef};
use std::time::Instant;
use tracing::{error, info, warn};

/// Process the latest document of `source` into `store`.
///
/// # Errors
/// - [`Pdf2SheetsError::NoFileFound`] when the source is empty (benign)
/// - [`Pdf2SheetsError::UnsupportedFileType`] when the latest file is not a PDF
/// - [`Pdf2SheetsError::EmptyDocument`] when the PDF has no pages (benign)
/// - any split, extraction or sheet error from the first failing batch
pub fn run(
    source: &dyn DocumentSource,
    extractor: &dyn Extractor,
    store: &mut dyn SheetStore,
    config: &RunConfig,
) -> Result<RunReport, Pdf2SheetsError> {
    let (file, bytes) = select_document(source)?;
    process_document(&file.name, &bytes, extractor, store, config)
}

/// [`run`], with every error logged and swallowed.
///
/// Benign outcomes are logged at INFO, everything else at ERROR. Meant for
/// unattended jobs where nobody consumes a structured failure.
pub fn run_logged(
    source: &dyn DocumentSource,
    extractor: &dyn Extractor,
    store: &mut dyn SheetStore,
    config: &RunConfig,
) -> Option<RunReport> {
    match run(source, extractor, store, config) {
        Ok(report) => Some(report),
        Err(e) if e.is_benign() => {
            info!("Nothing to do: {}", e);
            None
        }
        Err(e) => {
            error!("Run failed: {}", e);
            None
        }
    }
}

/// Pick the latest file from `source`, check that it is a PDF and read it.
pub fn select_document(
    source: &dyn DocumentSource,
) -> Result<(FileRef, Vec<u8>), Pdf2SheetsError> {
    let file = source
        .latest()?
        .ok_or_else(|| Pdf2SheetsError::NoFileFound {
            location: source.location(),
        })?;
    info!("Selected '{}' ({})", file.name, file.mime_type);

    if !file.is_pdf() {
        return Err(Pdf2SheetsError::UnsupportedFileType {
            name: file.name,
            mime_type: file.mime_type,
        });
    }

    let bytes = source.read(&file)?;
    check_pdf_magic(&file.name, &bytes)?;
    Ok((file, bytes))
}

/// Reject bytes that do not start with `%PDF`.
pub fn check_pdf_magic(name: &str, bytes: &[u8]) -> Result<(), Pdf2SheetsError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(Pdf2SheetsError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

/// Split an in-memory PDF and push every batch through extraction and
/// reconciliation.
pub fn process_document(
    name: &str,
    bytes: &[u8],
    extractor: &dyn Extractor,
    store: &mut dyn SheetStore,
    config: &RunConfig,
) -> Result<RunReport, Pdf2SheetsError> {
    let start = Instant::now();
    let pdfium = bind_pdfium(config.pdfium_lib_path.as_deref())?;
    let document = load_document(&pdfium, name, bytes, config.password.as_deref())?;
    let total_pages = document.pages().len() as usize;

    let batches = PageBatches::new(&pdfium, &document, config.max_pages_per_batch)?;
    let total_batches = batches.total_batches();

    let mut report = process_batches(
        name,
        total_pages,
        total_batches,
        batches,
        extractor,
        store,
        config,
    )?;
    report.duration_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}

/// Drive already-split batches through extraction and reconciliation.
///
/// Cleanup of stale sheets runs once, after the last batch, and only if
/// every batch succeeded.
pub fn process_batches<I>(
    name: &str,
    total_pages: usize,
    total_batches: usize,
    batches: I,
    extractor: &dyn Extractor,
    store: &mut dyn SheetStore,
    config: &RunConfig,
) -> Result<RunReport, Pdf2SheetsError>
where
    I: IntoIterator<Item = Result<PageBatch, Pdf2SheetsError>>,
{
    if total_batches == 0 {
        return Err(Pdf2SheetsError::EmptyDocument);
    }

    let start = Instant::now();
    let cb = config.progress_callback.as_ref();
    info!(
        "Processing '{}': {} pages in {} batches of ≤{}",
        name, total_pages, total_batches, config.max_pages_per_batch
    );
    if let Some(cb) = cb {
        cb.on_run_start(total_pages, total_batches);
    }

    let mut reconciler = Reconciler::new(store, config.empty_page_policy);
    let mut reports = Vec::with_capacity(total_batches);

    for (i, item) in batches.into_iter().enumerate() {
        let index = i + 1;
        if let Some(cb) = cb {
            cb.on_batch_start(index, total_batches);
        }

        match item.and_then(|batch| process_batch(&batch, extractor, &mut reconciler, config)) {
            Ok(report) => {
                info!(
                    "Batch {}/{}: pages {}-{} → {} sheets",
                    index,
                    total_batches,
                    report.first_page,
                    report.last_page,
                    report.sheets_written.len()
                );
                if let Some(cb) = cb {
                    cb.on_batch_complete(index, total_batches, report.sheets_written.len());
                }
                reports.push(report);
            }
            Err(e) => {
                error!(
                    "Batch {}/{} failed, aborting run: {}",
                    index, total_batches, e
                );
                if let Some(cb) = cb {
                    cb.on_batch_error(index, total_batches, &e.to_string());
                }
                return Err(e);
            }
        }
    }

    let summary = reconciler.finish()?;
    if let Some(cb) = cb {
        cb.on_run_complete(summary.written.len(), summary.deleted.len());
    }
    info!(
        "Run complete: {} sheets written, {} deleted in {}ms",
        summary.written.len(),
        summary.deleted.len(),
        start.elapsed().as_millis()
    );

    Ok(RunReport {
        file: name.to_string(),
        total_pages,
        batches: reports,
        sheets_written: summary.written,
        sheets_deleted: summary.deleted,
        duplicate_pages: summary.duplicate_pages,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn process_batch<S: SheetStore + ?Sized>(
    batch: &PageBatch,
    extractor: &dyn Extractor,
    reconciler: &mut Reconciler<'_, S>,
    config: &RunConfig,
) -> Result<BatchReport, Pdf2SheetsError> {
    let start = Instant::now();
    let markdown = extractor.extract(batch)?;
    let markdown = if config.clean_markdown {
        clean_markdown(&markdown)
    } else {
        markdown
    };

    let parsed = parse_pages(&markdown);
    if parsed.markers.is_empty() {
        warn!(
            "Batch {}: no page markers in {} bytes of Markdown",
            batch.index,
            markdown.len()
        );
    }
    let written = reconciler.apply(&parsed)?;

    Ok(BatchReport {
        index: batch.index,
        first_page: batch.pages.start + 1,
        last_page: batch.pages.end,
        markdown_bytes: markdown.len(),
        pages_found: parsed.markers.len(),
        sheets_written: written,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Load a PDF and report how it would be split, without contacting the
/// extraction service.
pub fn plan(pdf_bytes: &[u8], config: &RunConfig) -> Result<DocumentPlan, Pdf2SheetsError> {
    check_pdf_magic("document", pdf_bytes)?;
    let pdfium = bind_pdfium(config.pdfium_lib_path.as_deref())?;
    let document = load_document(&pdfium, "document", pdf_bytes, config.password.as_deref())?;
    Ok(plan_for(
        document.pages().len() as usize,
        config.max_pages_per_batch,
    ))
}

/// Batch layout for a document of `total_pages` pages.
pub fn plan_for(total_pages: usize, max_pages_per_batch: usize) -> DocumentPlan {
    DocumentPlan {
        total_pages,
        batches: batch_ranges(total_pages, max_pages_per_batch)
            .map(|r| (r.start + 1, r.end))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_check() {
        assert!(check_pdf_magic("a.pdf", b"%PDF-1.4\n...").is_ok());
        match check_pdf_magic("a.pdf", b"PK\x03\x04zip") {
            Err(Pdf2SheetsError::NotAPdf { name, magic }) => {
                assert_eq!(name, "a.pdf");
                assert_eq!(magic, b"PK\x03\x04".to_vec());
            }
            other => panic!("expected NotAPdf, got {other:?}"),
        }
        assert!(matches!(
            check_pdf_magic("tiny.pdf", b"%P"),
            Err(Pdf2SheetsError::NotAPdf { .. })
        ));
    }

    #[test]
    fn plan_layout_is_one_based_and_inclusive() {
        let plan = plan_for(23, 10);
        assert_eq!(plan.total_pages, 23);
        assert_eq!(plan.batches, vec![(1, 10), (11, 20), (21, 23)]);
    }

    #[test]
    fn plan_for_empty_document() {
        assert!(plan_for(0, 10).batches.is_empty());
    }
}
