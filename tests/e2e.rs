//! End-to-end tests against a real pdfium library.
//!
//! Documents are generated on the fly with blank pages, so no fixture files
//! are needed. The extraction service is replaced by an extractor that
//! answers with one marker per page of the batch it receives.
//!
//! Every test prints SKIP and returns when libpdfium cannot be bound. Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

use pdf2sheets::pipeline::split::{bind_pdfium, load_document, PageBatches};
use pdf2sheets::{
    plan, process_document, Extractor, MemorySheetStore, PageBatch,
    Pdf2SheetsError, RunConfig, SheetStore,
};
use pdfium_render::prelude::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Mutex;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// pdfium is bound once per test; tests take turns.
static PDFIUM_LOCK: Mutex<()> = Mutex::new(());

fn lib_path() -> Option<PathBuf> {
    std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from)
}

/// Bind pdfium or skip the calling test.
macro_rules! pdfium_or_skip {
    () => {{
        match bind_pdfium(lib_path().as_deref()) {
            Ok(p) => p,
            Err(e) => {
                println!("SKIP: {e}");
                return;
            }
        }
    }};
}

fn config(max_pages: usize) -> RunConfig {
    let mut builder = RunConfig::builder("http://127.0.0.1:9/").max_pages_per_batch(max_pages);
    if let Some(path) = lib_path() {
        builder = builder.pdfium_lib_path(path);
    }
    builder.build().expect("valid config")
}

/// A PDF with `pages` blank A4 pages.
fn blank_pdf(pdfium: &Pdfium, pages: usize) -> Vec<u8> {
    let mut doc = pdfium.create_new_pdf().expect("create document");
    for _ in 0..pages {
        doc.pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .expect("add page");
    }
    doc.save_to_bytes().expect("save document")
}

/// Answers `## Page N` plus one table row for every page of a batch.
#[derive(Default)]
struct MarkerEchoExtractor {
    seen: RefCell<Vec<(usize, usize)>>,
}

impl Extractor for MarkerEchoExtractor {
    fn extract(&self, batch: &PageBatch) -> Result<String, Pdf2SheetsError> {
        assert!(batch.bytes.starts_with(b"%PDF"), "batch {} is not a PDF", batch.index);
        self.seen.borrow_mut().push((batch.index, batch.len()));

        Ok(batch
            .pages
            .clone()
            .map(|i| format!("## Page {}\n|page|{}|", i + 1, i + 1))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

// ── Splitting ────────────────────────────────────────────────────────────────

#[test]
fn split_produces_standalone_batches() {
    let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let pdfium = pdfium_or_skip!();

    let bytes = blank_pdf(&pdfium, 23);
    let document = load_document(&pdfium, "blank.pdf", &bytes, None).expect("load");
    let batches = PageBatches::new(&pdfium, &document, 10).expect("batches");
    assert_eq!(batches.total_batches(), 3);

    let mut sizes = Vec::new();
    for batch in batches {
        let batch = batch.expect("batch");
        assert!(batch.bytes.starts_with(b"%PDF"));
        let part = pdfium
            .load_pdf_from_byte_slice(&batch.bytes, None)
            .expect("batch is a valid PDF");
        sizes.push((batch.index, batch.pages.clone(), part.pages().len() as usize));
    }
    assert_eq!(
        sizes,
        vec![(1, 0..10, 10), (2, 10..20, 10), (3, 20..23, 3)]
    );
}

#[test]
fn zero_page_document_is_empty() {
    let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let pdfium = pdfium_or_skip!();

    let bytes = blank_pdf(&pdfium, 0);
    let document = load_document(&pdfium, "empty.pdf", &bytes, None).expect("load");
    let err = PageBatches::new(&pdfium, &document, 10).err().expect("must fail");
    assert!(matches!(err, Pdf2SheetsError::EmptyDocument));
}

#[test]
fn garbage_bytes_are_corrupt() {
    let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let pdfium = pdfium_or_skip!();

    let err = load_document(&pdfium, "junk.pdf", b"%PDF-1.7\nnot really", None)
        .err()
        .expect("must fail");
    assert!(
        matches!(err, Pdf2SheetsError::CorruptPdf { .. }),
        "got {err:?}"
    );
}

// ── Full document ────────────────────────────────────────────────────────────

#[test]
fn document_to_sheets() {
    let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let pdfium = pdfium_or_skip!();

    let bytes = blank_pdf(&pdfium, 7);
    drop(pdfium);

    let extractor = MarkerEchoExtractor::default();
    let mut store = MemorySheetStore::new();
    store.create("d08").unwrap();
    store.create("Summary").unwrap();

    let report = process_document("seven.pdf", &bytes, &extractor, &mut store, &config(3))
        .expect("run succeeds");

    assert_eq!(*extractor.seen.borrow(), vec![(1, 3), (2, 3), (3, 1)]);
    assert_eq!(report.total_pages, 7);
    assert_eq!(report.batches.len(), 3);
    assert_eq!(
        report.sheets_written,
        vec!["d01", "d02", "d03", "d04", "d05", "d06", "d07"]
    );
    assert_eq!(report.sheets_deleted, vec!["d08"]);
    assert_eq!(
        store.get("d07").unwrap(),
        Some(vec![vec!["page".to_string(), "7".to_string()]])
    );
    assert!(store.contains("Summary").unwrap());
}

#[test]
fn plan_reports_layout() {
    let _guard = PDFIUM_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let pdfium = pdfium_or_skip!();

    let bytes = blank_pdf(&pdfium, 12);
    drop(pdfium);

    let layout = plan(&bytes, &config(5)).expect("plan");
    assert_eq!(layout.total_pages, 12);
    assert_eq!(layout.batches, vec![(1, 5), (6, 10), (11, 12)]);
    assert_eq!(plan(&bytes, &config(100)).expect("plan").batches, vec![(1, 12)]);
}
