//! Orchestration tests with a scripted extractor.
//!
//! Batches are synthesised directly, so nothing here needs pdfium or a
//! network. Run with:
//!   cargo test --test run

use pdf2sheets::{
    process_batches, run, run_logged, EmptyPagePolicy, Extractor, JsonWorkbook, LocalFolder,
    MemorySheetStore, PageBatch, Pdf2SheetsError, RunConfig, RunProgressCallback, SheetStore,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Answers each batch index with a canned response and records every call.
#[derive(Default)]
struct ScriptedExtractor {
    answers: HashMap<usize, Result<String, (u16, String)>>,
    calls: RefCell<Vec<usize>>,
}

impl ScriptedExtractor {
    fn ok(mut self, batch: usize, markdown: &str) -> Self {
        self.answers.insert(batch, Ok(markdown.to_string()));
        self
    }

    fn fail(mut self, batch: usize, status: u16, body: &str) -> Self {
        self.answers.insert(batch, Err((status, body.to_string())));
        self
    }

    fn calls(&self) -> Vec<usize> {
        self.calls.borrow().clone()
    }
}

impl Extractor for ScriptedExtractor {
    fn extract(&self, batch: &PageBatch) -> Result<String, Pdf2SheetsError> {
        self.calls.borrow_mut().push(batch.index);
        match self.answers.get(&batch.index) {
            Some(Ok(md)) => Ok(md.clone()),
            Some(Err((status, body))) => Err(Pdf2SheetsError::Extraction {
                batch: batch.index,
                status: *status,
                body: body.clone(),
            }),
            None => panic!("no scripted answer for batch {}", batch.index),
        }
    }
}

/// Batches of `per_batch` pages covering `total` pages, with dummy bytes.
fn batches(total: usize, per_batch: usize) -> Vec<Result<PageBatch, Pdf2SheetsError>> {
    (0..total)
        .step_by(per_batch)
        .enumerate()
        .map(|(i, start)| {
            Ok(PageBatch {
                index: i + 1,
                pages: start..(start + per_batch).min(total),
                bytes: b"%PDF-1.7 stub".to_vec(),
            })
        })
        .collect()
}

fn config() -> RunConfig {
    RunConfig::builder("http://127.0.0.1:9/extract")
        .max_pages_per_batch(2)
        .build()
        .unwrap()
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Create one single-cell sheet per `(name, text)` pair.
fn seed(store: &mut dyn SheetStore, sheets: &[(&str, &str)]) {
    for (name, text) in sheets {
        store.create(name).unwrap();
        store.write_rows(name, &[row(&[*text])]).unwrap();
    }
}

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl RunProgressCallback for EventLog {
    fn on_run_start(&self, total_pages: usize, total_batches: usize) {
        self.push(format!("start {total_pages}/{total_batches}"));
    }
    fn on_batch_start(&self, batch: usize, _total: usize) {
        self.push(format!("batch {batch}"));
    }
    fn on_batch_complete(&self, batch: usize, _total: usize, pages_written: usize) {
        self.push(format!("done {batch}: {pages_written}"));
    }
    fn on_batch_error(&self, batch: usize, _total: usize, _error: &str) {
        self.push(format!("error {batch}"));
    }
    fn on_run_complete(&self, written: usize, deleted: usize) {
        self.push(format!("complete {written}/{deleted}"));
    }
}

// ── Reconciliation across batches ────────────────────────────────────────────

#[test]
fn stale_pages_are_pruned_after_last_batch() {
    let mut store = MemorySheetStore::new();
    seed(
        &mut store,
        &[
            ("Notes", "hand-written"),
            ("d01", "old page 1"),
            ("d02", "old page 2"),
        ],
    );

    let extractor = ScriptedExtractor::default()
        .ok(1, "## Page 2\n|a|b|\n|c||d|")
        .ok(2, "--- Page 5 ---\nplain text");

    let report = process_batches("doc.pdf", 4, 2, batches(4, 2), &extractor, &mut store, &config())
        .unwrap();

    assert_eq!(report.sheets_written, vec!["d02", "d05"]);
    assert_eq!(report.sheets_deleted, vec!["d01"]);
    assert_eq!(report.batches.len(), 2);
    assert_eq!(report.batches[1].first_page, 3);
    assert_eq!(report.batches[1].last_page, 4);

    assert_eq!(store.get("d01").unwrap(), None);
    assert_eq!(
        store.get("d02").unwrap(),
        Some(vec![row(&["a", "b"]), row(&["c", "", "d"])])
    );
    assert_eq!(store.get("d05").unwrap(), Some(vec![row(&["plain text"])]));
    assert_eq!(store.get("Notes").unwrap(), Some(vec![row(&["hand-written"])]));
}

#[test]
fn page_numbers_come_from_markers_not_batch_position() {
    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default().ok(1, "## Page 41\nx\n## Page 42\ny");

    let report =
        process_batches("doc.pdf", 2, 1, batches(2, 2), &extractor, &mut store, &config()).unwrap();

    assert_eq!(report.sheets_written, vec!["d41", "d42"]);
    assert_eq!(report.batches[0].pages_found, 2);
}

#[test]
fn repeated_page_across_batches_keeps_last() {
    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default()
        .ok(1, "## Page 2\nfirst")
        .ok(2, "## Page 2\nsecond");

    let report =
        process_batches("doc.pdf", 4, 2, batches(4, 2), &extractor, &mut store, &config()).unwrap();

    assert_eq!(report.duplicate_pages, vec![2]);
    assert_eq!(store.get("d02").unwrap(), Some(vec![row(&["second"])]));
}

#[test]
fn empty_page_policy_decides_fate_of_old_sheet() {
    for (policy, survives) in [
        (EmptyPagePolicy::Retain, true),
        (EmptyPagePolicy::Release, false),
    ] {
        let mut store = MemorySheetStore::new();
        seed(&mut store, &[("d03", "from last run")]);
        let extractor = ScriptedExtractor::default().ok(1, "## Page 3\n   \n## Page 4\nfour");
        let config = RunConfig::builder("http://127.0.0.1:9/")
            .empty_page_policy(policy)
            .build()
            .unwrap();

        process_batches("doc.pdf", 2, 1, batches(2, 2), &extractor, &mut store, &config).unwrap();
        assert_eq!(store.contains("d03").unwrap(), survives, "{policy:?}");
    }
}

// ── Failure handling ─────────────────────────────────────────────────────────

#[test]
fn http_500_aborts_remaining_batches_and_keeps_written_sheets() {
    let mut store = MemorySheetStore::new();
    seed(&mut store, &[("d09", "stale")]);

    let extractor = ScriptedExtractor::default()
        .ok(1, "## Page 1\none\n## Page 2\ntwo")
        .fail(2, 500, "model overloaded")
        .ok(3, "## Page 5\nfive");

    let err = process_batches("doc.pdf", 6, 3, batches(6, 2), &extractor, &mut store, &config())
        .unwrap_err();

    match err {
        Pdf2SheetsError::Extraction { batch, status, body } => {
            assert_eq!(batch, 2);
            assert_eq!(status, 500);
            assert_eq!(body, "model overloaded");
        }
        other => panic!("expected Extraction, got {other:?}"),
    }
    assert_eq!(extractor.calls(), vec![1, 2], "batch 3 must never be sent");

    assert_eq!(store.get("d01").unwrap(), Some(vec![row(&["one"])]));
    assert_eq!(store.get("d02").unwrap(), Some(vec![row(&["two"])]));
    assert!(!store.contains("d05").unwrap());
    // No cleanup after a failed run.
    assert!(store.contains("d09").unwrap());
}

#[test]
fn partial_state_is_on_disk_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.json");
    let mut workbook = JsonWorkbook::open(&path).unwrap();

    let extractor = ScriptedExtractor::default()
        .ok(1, "## Page 1\n|h1|h2|")
        .fail(2, 502, "bad gateway");

    let result =
        process_batches("doc.pdf", 4, 2, batches(4, 2), &extractor, &mut workbook, &config());
    assert!(result.is_err());

    let reopened = JsonWorkbook::open(&path).unwrap();
    assert_eq!(reopened.list_names().unwrap(), vec!["d01"]);
    assert_eq!(reopened.get("d01").unwrap(), Some(vec![row(&["h1", "h2"])]));
}

#[test]
fn split_failure_aborts_like_extraction_failure() {
    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default().ok(1, "## Page 1\nx");

    let mut items = batches(4, 2);
    items[1] = Err(Pdf2SheetsError::SplitFailed {
        first: 3,
        last: 4,
        detail: "copy failed".into(),
    });

    let err = process_batches("doc.pdf", 4, 2, items, &extractor, &mut store, &config())
        .unwrap_err();
    assert!(matches!(err, Pdf2SheetsError::SplitFailed { first: 3, .. }));
    assert_eq!(extractor.calls(), vec![1]);
    assert!(store.contains("d01").unwrap());
}

#[test]
fn no_batches_is_empty_document() {
    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default();
    let err = process_batches("doc.pdf", 0, 0, Vec::new(), &extractor, &mut store, &config())
        .unwrap_err();
    assert!(matches!(err, Pdf2SheetsError::EmptyDocument));
    assert!(err.is_benign());
    assert!(extractor.calls().is_empty());
}

// ── Normalisation ────────────────────────────────────────────────────────────

#[test]
fn fenced_service_output_is_unwrapped_by_default() {
    let fenced = "```markdown\n## Page 1\n|x|\u{200B}\n```";

    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default().ok(1, fenced);
    process_batches("doc.pdf", 1, 1, batches(1, 1), &extractor, &mut store, &config()).unwrap();
    assert_eq!(store.get("d01").unwrap(), Some(vec![row(&["x"])]));

    let raw = RunConfig::builder("http://127.0.0.1:9/")
        .clean_markdown(false)
        .build()
        .unwrap();
    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default().ok(1, fenced);
    process_batches("doc.pdf", 1, 1, batches(1, 1), &extractor, &mut store, &raw).unwrap();
    let rows = store.get("d01").unwrap().unwrap();
    assert_eq!(rows.last(), Some(&row(&["```"])));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[test]
fn progress_events_follow_batches() {
    let log = Arc::new(EventLog::default());
    let config = RunConfig::builder("http://127.0.0.1:9/")
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let mut store = MemorySheetStore::new();
    seed(&mut store, &[("d07", "stale")]);
    let extractor = ScriptedExtractor::default()
        .ok(1, "## Page 1\na\n## Page 2\nb")
        .ok(2, "## Page 3\nc");

    process_batches("doc.pdf", 3, 2, batches(3, 2), &extractor, &mut store, &config).unwrap();

    assert_eq!(
        log.events(),
        vec![
            "start 3/2",
            "batch 1",
            "done 1: 2",
            "batch 2",
            "done 2: 1",
            "complete 3/1",
        ]
    );
}

#[test]
fn progress_reports_failed_batch() {
    let log = Arc::new(EventLog::default());
    let config = RunConfig::builder("http://127.0.0.1:9/")
        .progress_callback(log.clone())
        .build()
        .unwrap();

    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default().fail(1, 503, "unavailable");
    let _ = process_batches("doc.pdf", 2, 1, batches(2, 2), &extractor, &mut store, &config);

    assert_eq!(log.events(), vec!["start 2/1", "batch 1", "error 1"]);
}

// ── Source selection ─────────────────────────────────────────────────────────

fn write_file(dir: &Path, name: &str, bytes: &[u8]) {
    std::fs::write(dir.join(name), bytes).unwrap();
}

#[test]
fn empty_folder_is_no_file_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MemorySheetStore::new();
    seed(&mut store, &[("d01", "keep")]);
    let extractor = ScriptedExtractor::default();

    let err = run(&LocalFolder::new(dir.path()), &extractor, &mut store, &config()).unwrap_err();
    assert!(matches!(err, Pdf2SheetsError::NoFileFound { .. }));
    assert!(err.is_benign());
    assert!(store.contains("d01").unwrap(), "nothing is cleaned up");

    assert!(run_logged(&LocalFolder::new(dir.path()), &extractor, &mut store, &config()).is_none());
}

#[test]
fn non_pdf_file_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "scan.png", b"\x89PNG\r\n");
    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default();

    let err = run(&LocalFolder::new(dir.path()), &extractor, &mut store, &config()).unwrap_err();
    match err {
        Pdf2SheetsError::UnsupportedFileType { name, mime_type } => {
            assert_eq!(name, "scan.png");
            assert_eq!(mime_type, "image/png");
        }
        other => panic!("expected UnsupportedFileType, got {other:?}"),
    }
    assert!(extractor.calls().is_empty());
}

#[test]
fn pdf_extension_without_magic_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "fake.pdf", b"<html>not a pdf</html>");
    let mut store = MemorySheetStore::new();
    let extractor = ScriptedExtractor::default();

    let err = run(&LocalFolder::new(dir.path()), &extractor, &mut store, &config()).unwrap_err();
    assert!(matches!(err, Pdf2SheetsError::NotAPdf { .. }), "got {err:?}");
    assert!(!err.is_benign());
    assert!(run_logged(&LocalFolder::new(dir.path()), &extractor, &mut store, &config()).is_none());
}
