//! Error types for the pdf2sheets library.
//!
//! Every failure is a [`Pdf2SheetsError`]. Two of them are not really
//! failures: [`Pdf2SheetsError::EmptyDocument`] and
//! [`Pdf2SheetsError::NoFileFound`] mean "nothing to do" and are reported by
//! [`Pdf2SheetsError::is_benign`] so an unattended job can end quietly.
//!
//! Nothing is retried. The first extraction failure aborts the run and sheets
//! written by earlier batches stay in place.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2sheets library.
#[derive(Debug, Error)]
pub enum Pdf2SheetsError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// The document source yielded no file at all.
    #[error("No file found in '{location}'")]
    NoFileFound { location: String },

    /// The selected file is not a PDF.
    #[error("Unsupported file type for '{name}': {mime_type} (expected application/pdf)")]
    UnsupportedFileType { name: String, mime_type: String },

    /// The file claims to be a PDF but does not start with `%PDF`.
    #[error("File is not a valid PDF: '{name}'\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// Could not list or read the document source.
    #[error("Failed to read '{path}': {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The document has no pages; there is nothing to split.
    #[error("PDF has no pages")]
    EmptyDocument,

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// Copying a page range into a batch document failed.
    #[error("Failed to build batch for pages {first}-{last}: {detail}")]
    SplitFailed {
        first: usize,
        last: usize,
        detail: String,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass --pdfium-lib."
    )]
    PdfiumBindingFailed(String),

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The extraction service answered with something other than HTTP 200.
    #[error("Extraction failed for batch {batch} (HTTP {status}): {body}")]
    Extraction {
        batch: usize,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect error, timeout, bad body).
    #[error("HTTP request to '{url}' failed: {detail}")]
    Http { url: String, detail: String },

    // ── Sheet store errors ────────────────────────────────────────────────
    /// An operation addressed a sheet that does not exist.
    #[error("Sheet '{0}' does not exist")]
    SheetNotFound(String),

    /// `create` was called for a name that is already taken.
    #[error("Sheet '{0}' already exists")]
    SheetExists(String),

    /// The workbook file exists but could not be read.
    #[error("Failed to read workbook '{path}': {source}")]
    WorkbookRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook file is not valid workbook JSON.
    #[error("Workbook '{path}' is malformed: {detail}")]
    WorkbookParse { path: PathBuf, detail: String },

    /// Could not write the workbook file.
    #[error("Failed to write workbook '{path}': {source}")]
    WorkbookWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2SheetsError {
    /// `true` for outcomes that end a run without anything being wrong.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Pdf2SheetsError::EmptyDocument | Pdf2SheetsError::NoFileFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_display_carries_body() {
        let e = Pdf2SheetsError::Extraction {
            batch: 3,
            status: 500,
            body: "model overloaded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("batch 3"), "got: {msg}");
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("model overloaded"), "got: {msg}");
    }

    #[test]
    fn unsupported_type_display() {
        let e = Pdf2SheetsError::UnsupportedFileType {
            name: "scan.png".into(),
            mime_type: "image/png".into(),
        };
        assert!(e.to_string().contains("image/png"));
        assert!(e.to_string().contains("scan.png"));
    }

    #[test]
    fn benign_errors() {
        assert!(Pdf2SheetsError::EmptyDocument.is_benign());
        assert!(Pdf2SheetsError::NoFileFound {
            location: "/in".into()
        }
        .is_benign());
        assert!(!Pdf2SheetsError::Extraction {
            batch: 1,
            status: 502,
            body: String::new(),
        }
        .is_benign());
        assert!(!Pdf2SheetsError::UnsupportedFileType {
            name: "a.txt".into(),
            mime_type: "text/plain".into(),
        }
        .is_benign());
    }

    #[test]
    fn split_failed_display() {
        let e = Pdf2SheetsError::SplitFailed {
            first: 11,
            last: 20,
            detail: "boom".into(),
        };
        assert!(e.to_string().contains("11-20"));
    }
}
