use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single grid value as produced by any spreadsheet reader.
///
/// Cells carry no identity beyond their (row, column) position in the grid.
/// The untagged serde representation lets JSON fixtures round-trip naturally:
/// `null` is empty, numbers are numeric, `YYYY-MM-DD` strings become dates and
/// everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Date(NaiveDate),
    Number(f64),
    Text(String),
}

/// A row-major 2-D grid of cells. Column count may vary per row.
pub type Grid = Vec<Vec<Cell>>;

impl Cell {
    /// True for `Empty` and for text that is blank after trimming, which is
    /// how empty spreadsheet cells surface once a reader has stringified them.
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// The cell rendered as text, or `None` for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(text) => Some(text.clone()),
            Cell::Number(value) => Some(value.to_string()),
            Cell::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

/// Removes rows and columns whose every cell is `Empty`, keeping the remaining
/// cells in their original order and padding ragged rows with empties so the
/// result is rectangular. Whitespace-only text counts as content here (the
/// extractor tallies such rows instead). Row and column indices reported
/// downstream (header row, total rows) refer to this normalized grid.
pub fn normalize_grid(rows: &[Vec<Cell>]) -> Grid {
    let occupied: Vec<&Vec<Cell>> = rows.iter().filter(|row| !row_is_null(row)).collect();
    if occupied.is_empty() {
        return Vec::new();
    }

    let width = occupied.iter().map(|row| row.len()).max().unwrap_or(0);
    let kept_columns: Vec<usize> = (0..width)
        .filter(|&col| {
            occupied
                .iter()
                .any(|row| row.get(col).is_some_and(|cell| !matches!(cell, Cell::Empty)))
        })
        .collect();

    occupied
        .iter()
        .map(|row| {
            kept_columns
                .iter()
                .map(|&col| row.get(col).cloned().unwrap_or(Cell::Empty))
                .collect()
        })
        .collect()
}

fn row_is_null(row: &[Cell]) -> bool {
    row.iter().all(|cell| matches!(cell, Cell::Empty))
}
