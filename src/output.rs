//! Result types returned by a run.

use serde::Serialize;

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Name of the processed file.
    pub file: String,
    /// Pages in the source document.
    pub total_pages: usize,
    /// One entry per batch, in order.
    pub batches: Vec<BatchReport>,
    /// Sheets written during the run, sorted.
    pub sheets_written: Vec<String>,
    /// Stale sheets deleted at cleanup.
    pub sheets_deleted: Vec<String>,
    /// Page numbers that appeared more than once; the last occurrence won.
    pub duplicate_pages: Vec<u32>,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

/// What happened to one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// 1-indexed batch number.
    pub index: usize,
    /// First page of the batch, 1-indexed.
    pub first_page: usize,
    /// Last page of the batch, 1-indexed, inclusive.
    pub last_page: usize,
    /// Size of the Markdown the service returned.
    pub markdown_bytes: usize,
    /// Distinct page numbers whose marker appeared in the Markdown,
    /// including pages with empty content.
    pub pages_found: usize,
    /// Sheets written for this batch, in marker order.
    pub sheets_written: Vec<String>,
    pub duration_ms: u64,
}

/// Batch layout of a document, computed without contacting the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentPlan {
    pub total_pages: usize,
    /// `(first_page, last_page)` per batch, 1-indexed and inclusive.
    pub batches: Vec<(usize, usize)>,
}
