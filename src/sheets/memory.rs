//! In-memory sheet store.
//!
//! Used directly in tests and as the working copy behind
//! [`crate::sheets::JsonWorkbook`].

use super::SheetStore;
use crate::error::Pdf2SheetsError;
use crate::pipeline::rows::Row;
use serde::{Deserialize, Serialize};

/// One named tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

/// Ordered collection of sheets held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySheetStore {
    sheets: Vec<Sheet>,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All sheets, in tab order.
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Sheet, Pdf2SheetsError> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| Pdf2SheetsError::SheetNotFound(name.to_string()))
    }
}

impl SheetStore for MemorySheetStore {
    fn get(&self, name: &str) -> Result<Option<Vec<Row>>, Pdf2SheetsError> {
        Ok(self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.rows.clone()))
    }

    fn create(&mut self, name: &str) -> Result<(), Pdf2SheetsError> {
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(Pdf2SheetsError::SheetExists(name.to_string()));
        }
        self.sheets.push(Sheet {
            name: name.to_string(),
            rows: Vec::new(),
        });
        Ok(())
    }

    fn clear(&mut self, name: &str) -> Result<(), Pdf2SheetsError> {
        self.find_mut(name)?.rows.clear();
        Ok(())
    }

    fn write_rows(&mut self, name: &str, rows: &[Row]) -> Result<(), Pdf2SheetsError> {
        let sheet = self.find_mut(name)?;
        for (i, row) in rows.iter().enumerate() {
            if i < sheet.rows.len() {
                sheet.rows[i] = row.clone();
            } else {
                sheet.rows.push(row.clone());
            }
        }
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), Pdf2SheetsError> {
        let before = self.sheets.len();
        self.sheets.retain(|s| s.name != name);
        if self.sheets.len() == before {
            return Err(Pdf2SheetsError::SheetNotFound(name.to_string()));
        }
        Ok(())
    }

    fn list_names(&self) -> Result<Vec<String>, Pdf2SheetsError> {
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }
}
