//! Pipeline stages for PDF-to-sheets processing.
//!
//! Each submodule implements exactly one transformation step and is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! split ──▶ extract ──▶ normalize ──▶ pages ──▶ rows ──▶ (sheets)
//! (pdfium)  (HTTP POST)  (cleanup)    (markers) (cells)
//! ```
//!
//! 1. [`split`]    : cut the PDF into standalone batch PDFs of ≤ N pages
//! 2. [`extract`]  : send one batch to the extraction service; the only
//!    stage with network I/O
//! 3. [`normalize`]: strip transport artefacts (fences, CRLF, invisible chars)
//! 4. [`pages`]    : split the Markdown on page markers
//! 5. [`rows`]     : turn one page's Markdown into spreadsheet rows

pub mod extract;
pub mod normalize;
pub mod pages;
pub mod rows;
pub mod split;
