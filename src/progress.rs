//! Progress-callback trait for per-batch run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events as
//! the run sends each batch to the extraction service and writes its pages.
//!
//! # Example
//!
//! ```rust
//! use pdf2sheets::{RunConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_batch_complete(&self, batch: usize, total_batches: usize, pages_written: usize) {
//!         self.pages.fetch_add(pages_written, Ordering::SeqCst);
//!         eprintln!("batch {batch}/{total_batches}: {pages_written} sheets");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//!
//! let config = RunConfig::builder("http://localhost:5000/")
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each batch.
///
/// Batches run strictly one after another, but the trait is `Send + Sync` so
/// a configured [`crate::RunConfig`] can be shared freely. All methods have
/// default no-op implementations.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after the PDF is loaded and before the first request.
    ///
    /// # Arguments
    /// * `total_pages`  : pages in the source document
    /// * `total_batches`: number of requests that will be sent
    fn on_run_start(&self, total_pages: usize, total_batches: usize) {
        let _ = (total_pages, total_batches);
    }

    /// Called just before a batch is sent to the extraction service.
    ///
    /// `batch` is 1-indexed.
    fn on_batch_start(&self, batch: usize, total_batches: usize) {
        let _ = (batch, total_batches);
    }

    /// Called after a batch's pages have been written to their sheets.
    ///
    /// # Arguments
    /// * `batch`        : 1-indexed batch number
    /// * `total_batches`: total batches in the run
    /// * `pages_written`: sheets written for this batch
    fn on_batch_complete(&self, batch: usize, total_batches: usize, pages_written: usize) {
        let _ = (batch, total_batches, pages_written);
    }

    /// Called when a batch fails. The run aborts right after.
    fn on_batch_error(&self, batch: usize, total_batches: usize, error: &str) {
        let _ = (batch, total_batches, error);
    }

    /// Called once after cleanup of stale sheets.
    fn on_run_complete(&self, sheets_written: usize, sheets_deleted: usize) {
        let _ = (sheets_written, sheets_deleted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(12, 2);
        cb.on_batch_start(1, 2);
        cb.on_batch_complete(1, 2, 10);
        cb.on_batch_error(2, 2, "HTTP 500");
        cb.on_run_complete(10, 0);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_run_start(3, 1);
        cb.on_batch_complete(1, 1, 3);
    }
}
