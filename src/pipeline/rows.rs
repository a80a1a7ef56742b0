//! Row conversion: turn one page's Markdown into spreadsheet rows.
//!
//! A line whose trimmed form starts and ends with `|` is a table row and is
//! split into cells. Every other line becomes a one-cell row, verbatim.
//! Rows may have different widths; separator rows such as `|---|---|` are
//! ordinary rows of dashes.

/// An ordered list of cell values. Never empty.
pub type Row = Vec<String>;

/// Convert page content into rows, one per retained line.
pub fn to_rows(content: &str) -> Vec<Row> {
    content.lines().filter_map(line_to_row).collect()
}

/// Convert a single physical line. Returns `None` for a pipe line with no
/// cells left (e.g. a lone `|`).
pub fn line_to_row(line: &str) -> Option<Row> {
    let trimmed = line.trim();
    if trimmed.starts_with('|') && trimmed.ends_with('|') {
        let row = split_cells(trimmed);
        if row.is_empty() {
            None
        } else {
            Some(row)
        }
    } else {
        Some(vec![line.to_string()])
    }
}

/// Split a `|`-delimited line, dropping the empty edge cells produced by the
/// opening and closing pipes. Interior empty cells are kept.
fn split_cells(trimmed: &str) -> Row {
    let mut cells: Vec<&str> = trimmed.split('|').collect();
    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(|c| c.trim().to_string()).collect()
}
