//! Page-batch splitting: cut a PDF into independent PDFs of at most N pages.
//!
//! Batches are produced lazily by [`PageBatches`]: each call to `next()`
//! creates a fresh pdfium document, copies one contiguous page range into it
//! and serialises it to bytes. Only one batch blob is alive at a time.

use crate::error::Pdf2SheetsError;
use pdfium_render::prelude::*;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, info};

/// One contiguous slice of the source document, serialised as its own PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBatch {
    /// 1-indexed batch number.
    pub index: usize,
    /// 0-indexed, half-open page range `[start, end)` in the source document.
    pub pages: Range<usize>,
    /// The batch as a standalone PDF.
    pub bytes: Vec<u8>,
}

impl PageBatch {
    /// Number of pages in this batch.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Iterator over `[start, end)` ranges partitioning `0..total` into chunks of
/// at most `max` pages.
#[derive(Debug, Clone)]
pub struct BatchRanges {
    next: usize,
    total: usize,
    max: usize,
}

impl Iterator for BatchRanges {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let start = self.next;
        let end = (start + self.max).min(self.total);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = batch_count(self.total - self.next.min(self.total), self.max);
        (n, Some(n))
    }
}

impl ExactSizeIterator for BatchRanges {}

/// Partition `0..total_pages` into ascending ranges of at most
/// `max_pages_per_batch` pages. A zero batch size is treated as 1.
pub fn batch_ranges(total_pages: usize, max_pages_per_batch: usize) -> BatchRanges {
    BatchRanges {
        next: 0,
        total: total_pages,
        max: max_pages_per_batch.max(1),
    }
}

/// Number of batches needed for `total_pages`.
pub fn batch_count(total_pages: usize, max_pages_per_batch: usize) -> usize {
    total_pages.div_ceil(max_pages_per_batch.max(1))
}

/// Lazy sequence of [`PageBatch`]es cut from a loaded document.
pub struct PageBatches<'a, 'doc> {
    pdfium: &'a Pdfium,
    source: &'a PdfDocument<'doc>,
    ranges: BatchRanges,
    emitted: usize,
}

impl<'a, 'doc> PageBatches<'a, 'doc> {
    /// Prepare to split `source`.
    ///
    /// # Errors
    /// [`Pdf2SheetsError::EmptyDocument`] when the document has no pages.
    pub fn new(
        pdfium: &'a Pdfium,
        source: &'a PdfDocument<'doc>,
        max_pages_per_batch: usize,
    ) -> Result<Self, Pdf2SheetsError> {
        let total = source.pages().len() as usize;
        if total == 0 {
            return Err(Pdf2SheetsError::EmptyDocument);
        }
        Ok(Self {
            pdfium,
            source,
            ranges: batch_ranges(total, max_pages_per_batch),
            emitted: 0,
        })
    }

    /// Total number of batches this iterator yields.
    pub fn total_batches(&self) -> usize {
        self.emitted + self.ranges.len()
    }

    fn build(&self, pages: Range<usize>) -> Result<Vec<u8>, Pdf2SheetsError> {
        let split_err = |detail: String| Pdf2SheetsError::SplitFailed {
            first: pages.start + 1,
            last: pages.end,
            detail,
        };

        let mut batch = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| split_err(format!("{:?}", e)))?;

        let first = pages.start as PdfPageIndex;
        let last = (pages.end - 1) as PdfPageIndex;
        batch
            .pages_mut()
            .copy_page_range_from_document(self.source, first..=last, 0)
            .map_err(|e| split_err(format!("{:?}", e)))?;

        batch
            .save_to_bytes()
            .map_err(|e| split_err(format!("{:?}", e)))
    }
}

impl Iterator for PageBatches<'_, '_> {
    type Item = Result<PageBatch, Pdf2SheetsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let pages = self.ranges.next()?;
        self.emitted += 1;
        let index = self.emitted;
        let result = self.build(pages.clone()).map(|bytes| {
            debug!(
                "Batch {}: pages {}-{} → {} bytes",
                index,
                pages.start + 1,
                pages.end,
                bytes.len()
            );
            PageBatch {
                index,
                pages,
                bytes,
            }
        });
        Some(result)
    }
}

/// Bind to a pdfium library.
///
/// An explicit `lib_path` wins; otherwise `./` is tried before the system
/// library search path.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, Pdf2SheetsError> {
    let bindings = match lib_path {
        Some(path) => Pdfium::bind_to_library(path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| Pdf2SheetsError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

/// Load a PDF from memory, mapping pdfium's load errors onto ours.
pub fn load_document<'doc>(
    pdfium: &'doc Pdfium,
    name: &str,
    bytes: &'doc [u8],
    password: Option<&'doc str>,
) -> Result<PdfDocument<'doc>, Pdf2SheetsError> {
    let document = pdfium.load_pdf_from_byte_slice(bytes, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                Pdf2SheetsError::WrongPassword {
                    name: name.to_string(),
                }
            } else {
                Pdf2SheetsError::PasswordRequired {
                    name: name.to_string(),
                }
            }
        } else {
            Pdf2SheetsError::CorruptPdf {
                name: name.to_string(),
                detail: err_str,
            }
        }
    })?;

    info!("PDF '{}' loaded: {} pages", name, document.pages().len());
    Ok(document)
}
