//! File-backed workbook: sheets persisted as one JSON document.
//!
//! ```json
//! { "sheets": [ { "name": "d01", "rows": [["a", "b"], ["plain text"]] } ] }
//! ```
//!
//! Every mutation rewrites the file atomically (temp file in the same
//! directory, then rename), so an interrupted run leaves the last completed
//! write on disk and never a truncated file.

use super::memory::MemorySheetStore;
use super::SheetStore;
use crate::error::Pdf2SheetsError;
use crate::pipeline::rows::Row;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A [`SheetStore`] persisted to a JSON file.
#[derive(Debug)]
pub struct JsonWorkbook {
    path: PathBuf,
    sheets: MemorySheetStore,
}

impl JsonWorkbook {
    /// Open the workbook at `path`. A missing file is an empty workbook; it
    /// is created on the first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Pdf2SheetsError> {
        let path = path.as_ref().to_path_buf();
        let sheets = match std::fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| Pdf2SheetsError::WorkbookParse {
                    path: path.clone(),
                    detail: e.to_string(),
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MemorySheetStore::new(),
            Err(e) => return Err(Pdf2SheetsError::WorkbookRead { path, source: e }),
        };
        debug!(
            "Opened workbook {} ({} sheets)",
            path.display(),
            sheets.sheets().len()
        );
        Ok(Self { path, sheets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory view of the workbook.
    pub fn sheets(&self) -> &MemorySheetStore {
        &self.sheets
    }

    fn save(&self) -> Result<(), Pdf2SheetsError> {
        let write_err = |source: std::io::Error| Pdf2SheetsError::WorkbookWrite {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(write_err)?;

        let json = serde_json::to_vec_pretty(&self.sheets)
            .map_err(|e| Pdf2SheetsError::Internal(format!("workbook serialisation: {e}")))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl SheetStore for JsonWorkbook {
    fn get(&self, name: &str) -> Result<Option<Vec<Row>>, Pdf2SheetsError> {
        self.sheets.get(name)
    }

    fn create(&mut self, name: &str) -> Result<(), Pdf2SheetsError> {
        self.sheets.create(name)?;
        self.save()
    }

    fn clear(&mut self, name: &str) -> Result<(), Pdf2SheetsError> {
        self.sheets.clear(name)?;
        self.save()
    }

    fn write_rows(&mut self, name: &str, rows: &[Row]) -> Result<(), Pdf2SheetsError> {
        self.sheets.write_rows(name, rows)?;
        self.save()
    }

    fn delete(&mut self, name: &str) -> Result<(), Pdf2SheetsError> {
        self.sheets.delete(name)?;
        self.save()
    }

    fn list_names(&self) -> Result<Vec<String>, Pdf2SheetsError> {
        self.sheets.list_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn missing_file_is_empty_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let wb = JsonWorkbook::open(dir.path().join("book.json")).unwrap();
        assert!(wb.list_names().unwrap().is_empty());
        assert!(!wb.path().exists());
    }

    #[test]
    fn mutations_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("book.json");

        let mut wb = JsonWorkbook::open(&path).unwrap();
        wb.create("Summary").unwrap();
        wb.create("d01").unwrap();
        wb.write_rows("d01", &[row(&["a", "", "b"]), row(&["text"])]).unwrap();
        assert!(path.exists());

        let mut reopened = JsonWorkbook::open(&path).unwrap();
        assert_eq!(reopened.list_names().unwrap(), vec!["Summary", "d01"]);
        assert_eq!(
            reopened.get("d01").unwrap(),
            Some(vec![row(&["a", "", "b"]), row(&["text"])])
        );

        reopened.delete("d01").unwrap();
        let again = JsonWorkbook::open(&path).unwrap();
        assert_eq!(again.list_names().unwrap(), vec!["Summary"]);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonWorkbook::open(&path).unwrap_err();
        assert!(matches!(err, Pdf2SheetsError::WorkbookParse { .. }));
    }

    #[test]
    fn failed_mutation_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        let mut wb = JsonWorkbook::open(&path).unwrap();
        assert!(wb.delete("d09").is_err());
        assert!(!path.exists());
    }
}
