//! Destination sheets: storage abstraction, naming, and reconciliation.
//!
//! Each page of the source document gets its own sheet named `d` plus the
//! page number padded to two digits (`d07`, `d123`). Over a run the
//! [`Reconciler`] writes every page block it is given, remembering which page
//! numbers were produced. [`Reconciler::finish`] then deletes destination
//! sheets left over from earlier runs. Sheets whose names do not follow the
//! destination pattern are never touched.

pub mod memory;
pub mod workbook;

use crate::config::EmptyPagePolicy;
use crate::error::Pdf2SheetsError;
use crate::pipeline::pages::ParsedPages;
use crate::pipeline::rows::{to_rows, Row};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

pub use memory::MemorySheetStore;
pub use workbook::JsonWorkbook;

/// Leading character of every destination sheet name.
pub const SHEET_PREFIX: char = 'd';

/// Spreadsheet operations the reconciler needs.
///
/// Rows are 0-based internally; row 0 is the spreadsheet's row 1.
pub trait SheetStore {
    /// Contents of the named sheet, or `None` if it does not exist.
    fn get(&self, name: &str) -> Result<Option<Vec<Row>>, Pdf2SheetsError>;

    /// Create an empty sheet. Fails if the name is taken.
    fn create(&mut self, name: &str) -> Result<(), Pdf2SheetsError>;

    /// Remove all contents of an existing sheet.
    fn clear(&mut self, name: &str) -> Result<(), Pdf2SheetsError>;

    /// Write `rows` starting at the first row, first column. Rows below the
    /// written range are left as they are.
    fn write_rows(&mut self, name: &str, rows: &[Row]) -> Result<(), Pdf2SheetsError>;

    /// Delete an existing sheet.
    fn delete(&mut self, name: &str) -> Result<(), Pdf2SheetsError>;

    /// Names of all sheets, in tab order.
    fn list_names(&self) -> Result<Vec<String>, Pdf2SheetsError>;

    fn contains(&self, name: &str) -> Result<bool, Pdf2SheetsError> {
        Ok(self.get(name)?.is_some())
    }
}

/// Destination sheet name for a page: `d` + at least two digits.
pub fn sheet_name(page_number: u32) -> String {
    format!("{SHEET_PREFIX}{page_number:02}")
}

/// Whether `name` is a destination sheet (`d` followed by two or more
/// ASCII digits).
pub fn is_destination_sheet(name: &str) -> bool {
    match name.strip_prefix(SHEET_PREFIX) {
        Some(digits) => digits.len() >= 2 && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Outcome of stale-sheet cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Sheets written during the run, sorted.
    pub written: Vec<String>,
    /// Stale sheets deleted at cleanup, in tab order.
    pub deleted: Vec<String>,
    /// Page numbers written more than once (last write wins).
    pub duplicate_pages: Vec<u32>,
}

/// Writes page blocks into a [`SheetStore`] and prunes stale pages.
///
/// Create one per run; feed every batch through [`Reconciler::apply`] and
/// call [`Reconciler::finish`] once after the last batch.
pub struct Reconciler<'s, S: SheetStore + ?Sized> {
    store: &'s mut S,
    policy: EmptyPagePolicy,
    used: BTreeSet<u32>,
    writes: BTreeMap<u32, usize>,
}

impl<'s, S: SheetStore + ?Sized> Reconciler<'s, S> {
    pub fn new(store: &'s mut S, policy: EmptyPagePolicy) -> Self {
        Self {
            store,
            policy,
            used: BTreeSet::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Write every block of one parsed batch. Returns the sheet names
    /// written, in block order.
    pub fn apply(&mut self, parsed: &ParsedPages) -> Result<Vec<String>, Pdf2SheetsError> {
        if self.policy == EmptyPagePolicy::Retain {
            self.used.extend(parsed.markers.iter().copied());
        }

        let mut written = Vec::with_capacity(parsed.blocks.len());
        for block in &parsed.blocks {
            let rows = to_rows(&block.content);
            written.push(self.write_page(block.page_number, &rows)?);
        }
        Ok(written)
    }

    /// Replace the contents of a page's sheet with `rows`, creating the sheet
    /// if needed.
    pub fn write_page(&mut self, page_number: u32, rows: &[Row]) -> Result<String, Pdf2SheetsError> {
        let name = sheet_name(page_number);
        self.used.insert(page_number);

        let count = self.writes.entry(page_number).or_insert(0);
        *count += 1;
        if *count > 1 {
            warn!(
                "Page {} appeared again; overwriting sheet '{}'",
                page_number, name
            );
        }

        if self.store.contains(&name)? {
            self.store.clear(&name)?;
        } else {
            self.store.create(&name)?;
        }
        self.store.write_rows(&name, rows)?;
        debug!("Wrote {} rows to '{}'", rows.len(), name);
        Ok(name)
    }

    /// Page numbers that currently protect their sheets from cleanup.
    pub fn used_pages(&self) -> &BTreeSet<u32> {
        &self.used
    }

    /// Delete destination sheets whose page was not produced in this run.
    pub fn finish(self) -> Result<ReconcileSummary, Pdf2SheetsError> {
        let keep: BTreeSet<String> = self.used.iter().map(|&n| sheet_name(n)).collect();

        let mut deleted = Vec::new();
        for name in self.store.list_names()? {
            if is_destination_sheet(&name) && !keep.contains(&name) {
                self.store.delete(&name)?;
                info!("Deleted stale sheet '{}'", name);
                deleted.push(name);
            }
        }

        Ok(ReconcileSummary {
            written: self.writes.keys().map(|&n| sheet_name(n)).collect(),
            deleted,
            duplicate_pages: self
                .writes
                .iter()
                .filter(|(_, c)| **c > 1)
                .map(|(&n, _)| n)
                .collect(),
        })
    }
}
