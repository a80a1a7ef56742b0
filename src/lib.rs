//! # pdf2sheets
//!
//! Turn the pages of a PDF into spreadsheet tabs, one tab per page.
//!
//! The heavy lifting (reading the page images) is done by a remote
//! extraction service that accepts a PDF and answers with Markdown in which
//! every page is introduced by a marker line. This crate does everything
//! around that call: it cuts the document into small PDFs, sends them one by
//! one, splits the answers back into pages, turns each page into rows and
//! keeps a set of `dNN` sheets in sync with the document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! folder / file
//!  │
//!  ├─ 1. Source     pick the newest file, check it is a PDF
//!  ├─ 2. Split      pdfium copies ≤N pages into a standalone PDF per batch
//!  ├─ 3. Extract    blocking POST to the service, Markdown back
//!  ├─ 4. Normalise  strip outer fences, CRLF, invisible characters
//!  ├─ 5. Pages      "## Page 7" / "--- Page 7 ---" markers → page blocks
//!  ├─ 6. Rows       pipe-table lines → cells, other lines → one cell
//!  └─ 7. Sheets     write d07, …; after the last batch delete stale dNN
//! ```
//!
//! Batches run strictly one after another. The first failing batch ends the
//! run; what was already written stays.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2sheets::{run, HttpExtractor, JsonWorkbook, LocalFolder, RunConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder("http://localhost:5000/extract").build()?;
//!     let source = LocalFolder::new("./inbox");
//!     let extractor = HttpExtractor::new(&config)?;
//!     let mut workbook = JsonWorkbook::open("pages.json")?;
//!
//!     let report = run(&source, &extractor, &mut workbook, &config)?;
//!     eprintln!("{} sheets written, {} deleted",
//!         report.sheets_written.len(),
//!         report.sheets_deleted.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2sheets` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2sheets = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod run;
pub mod sheets;
pub mod source;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EmptyPagePolicy, RunConfig, RunConfigBuilder, DEFAULT_MAX_PAGES_PER_BATCH};
pub use error::Pdf2SheetsError;
pub use output::{BatchReport, DocumentPlan, RunReport};
pub use pipeline::extract::{Extractor, HttpExtractor};
pub use pipeline::split::PageBatch;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{plan, process_batches, process_document, run, run_logged, select_document};
pub use sheets::{JsonWorkbook, MemorySheetStore, Reconciler, SheetStore};
pub use source::{DocumentSource, FileRef, LocalFolder, SingleFile};
