//! Document sources: where the PDF to process comes from.
//!
//! A source answers one question, "which file is current?", and can read the
//! file it names. Having no file at all is a normal answer (`Ok(None)`), not
//! an error; the orchestrator turns it into the benign
//! [`Pdf2SheetsError::NoFileFound`].

use crate::error::Pdf2SheetsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// MIME type every processed document must have.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Metadata for one candidate document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Source-specific identifier. For local sources, the full path.
    pub id: String,
    /// Display name (file name without directory).
    pub name: String,
    pub mime_type: String,
    /// Last modification time.
    pub modified: SystemTime,
}

impl FileRef {
    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }
}

/// A place that yields the document to process.
pub trait DocumentSource {
    /// The most recently modified file, or `None` when there is nothing.
    fn latest(&self) -> Result<Option<FileRef>, Pdf2SheetsError>;

    /// Raw bytes of a file previously returned by [`DocumentSource::latest`].
    fn read(&self, file: &FileRef) -> Result<Vec<u8>, Pdf2SheetsError>;

    /// Human-readable location, used in logs and errors.
    fn location(&self) -> String;
}

/// A directory on the local file system. The newest regular, non-hidden file
/// wins; ties on modification time go to the greater file name.
#[derive(Debug, Clone)]
pub struct LocalFolder {
    dir: PathBuf,
}

impl LocalFolder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DocumentSource for LocalFolder {
    fn latest(&self) -> Result<Option<FileRef>, Pdf2SheetsError> {
        let read_err = |source: std::io::Error| Pdf2SheetsError::SourceRead {
            path: self.dir.clone(),
            source,
        };

        let mut newest: Option<FileRef> = None;
        for entry in std::fs::read_dir(&self.dir).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            let Some(file) = file_ref(&path)? else {
                continue;
            };
            let is_newer = match &newest {
                None => true,
                Some(cur) => (file.modified, &file.name) > (cur.modified, &cur.name),
            };
            if is_newer {
                newest = Some(file);
            }
        }

        match &newest {
            Some(f) => debug!("Latest file in {}: {}", self.dir.display(), f.name),
            None => debug!("No candidate files in {}", self.dir.display()),
        }
        Ok(newest)
    }

    fn read(&self, file: &FileRef) -> Result<Vec<u8>, Pdf2SheetsError> {
        read_path(Path::new(&file.id))
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// One explicit file. A missing file yields `None`.
#[derive(Debug, Clone)]
pub struct SingleFile {
    path: PathBuf,
}

impl SingleFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentSource for SingleFile {
    fn latest(&self) -> Result<Option<FileRef>, Pdf2SheetsError> {
        if !self.path.exists() {
            return Ok(None);
        }
        file_ref(&self.path)
    }

    fn read(&self, file: &FileRef) -> Result<Vec<u8>, Pdf2SheetsError> {
        read_path(Path::new(&file.id))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// MIME type guessed from the file extension, `application/octet-stream`
/// when unknown.
pub fn mime_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Build a [`FileRef`] for `path`, or `None` if it is hidden or not a
/// regular file.
fn file_ref(path: &Path) -> Result<Option<FileRef>, Pdf2SheetsError> {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) if !n.starts_with('.') => n.to_string(),
        _ => return Ok(None),
    };

    let read_err = |source: std::io::Error| Pdf2SheetsError::SourceRead {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(read_err)?;
    if !meta.is_file() {
        return Ok(None);
    }

    Ok(Some(FileRef {
        id: path.display().to_string(),
        name,
        mime_type: mime_type_for(path),
        modified: meta.modified().map_err(read_err)?,
    }))
}

fn read_path(path: &Path) -> Result<Vec<u8>, Pdf2SheetsError> {
    std::fs::read(path).map_err(|source| Pdf2SheetsError::SourceRead {
        path: path.to_path_buf(),
        source,
    })
}
