use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cell::Cell;

pub const DATE_KEYWORDS: [&str; 5] = [
    "date",
    "tran date",
    "txn date",
    "transaction date",
    "value date",
];
pub const DESCRIPTION_KEYWORDS: [&str; 5] = [
    "description",
    "narration",
    "particulars",
    "details",
    "transaction details",
];
pub const DEBIT_KEYWORDS: [&str; 5] = ["debit", "withdrawal", "dr", "amount withdrawn", "paid"];
pub const CREDIT_KEYWORDS: [&str; 5] = ["credit", "deposit", "cr", "amount deposited", "received"];
pub const BALANCE_KEYWORDS: [&str; 3] = ["balance", "closing balance", "available balance"];
pub const REFERENCE_KEYWORDS: [&str; 5] =
    ["chq no", "cheque", "ref no", "reference", "transaction id"];

/// The semantic meaning assigned to a grid column during structure detection.
/// Declaration order is the matching priority: a header cell that matches
/// several keyword sets is claimed by the earliest role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Date,
    Description,
    Debit,
    Credit,
    Balance,
    Reference,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 6] = [
        ColumnRole::Date,
        ColumnRole::Description,
        ColumnRole::Debit,
        ColumnRole::Credit,
        ColumnRole::Balance,
        ColumnRole::Reference,
    ];

    /// The substrings that mark a header cell as carrying this role.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Date => &DATE_KEYWORDS,
            ColumnRole::Description => &DESCRIPTION_KEYWORDS,
            ColumnRole::Debit => &DEBIT_KEYWORDS,
            ColumnRole::Credit => &CREDIT_KEYWORDS,
            ColumnRole::Balance => &BALANCE_KEYWORDS,
            ColumnRole::Reference => &REFERENCE_KEYWORDS,
        }
    }
}

/// Where the transaction table sits in a grid: the header row index and the
/// role assigned to each recognized column. Unrecognized columns are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub header_row: usize,
    pub columns: BTreeMap<ColumnRole, usize>,
}

impl TableLayout {
    pub fn column(&self, role: ColumnRole) -> Option<usize> {
        self.columns.get(&role).copied()
    }
}

/// Finds the header row and maps columns to roles.
///
/// The first row within the scan window whose concatenated lowercased text
/// contains a date, debit or credit keyword is the header; if none matches,
/// row 0 is used rather than failing. Matching is plain substring containment
/// on both passes. When two columns match the same role the later column
/// overwrites the earlier assignment; that tie-break is an artifact of
/// sequential assignment, not a considered contract.
pub fn detect_layout(grid: &[Vec<Cell>], scan_rows: usize) -> TableLayout {
    let mut header_row = 0;
    for (idx, row) in grid.iter().take(scan_rows.min(grid.len())).enumerate() {
        let row_text = joined_row_text(row);
        let is_header = DATE_KEYWORDS
            .iter()
            .chain(DEBIT_KEYWORDS.iter())
            .chain(CREDIT_KEYWORDS.iter())
            .any(|keyword| row_text.contains(keyword));
        if is_header {
            header_row = idx;
            info!("Detected header row: {}", idx);
            break;
        }
    }

    let mut columns = BTreeMap::new();
    if let Some(header) = grid.get(header_row) {
        for (col_idx, cell) in header.iter().enumerate() {
            let Some(text) = cell.as_text() else {
                continue;
            };
            let header_text = text.trim().to_lowercase();
            for role in ColumnRole::ALL {
                if role
                    .keywords()
                    .iter()
                    .any(|keyword| header_text.contains(keyword))
                {
                    columns.insert(role, col_idx);
                    break;
                }
            }
        }
    }

    debug!("Column mapping: {:?}", columns);
    TableLayout {
        header_row,
        columns,
    }
}

fn joined_row_text(row: &[Cell]) -> String {
    row.iter()
        .filter_map(|cell| cell.as_text())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|&cell| Cell::from(cell)).collect()
    }

    #[test]
    fn test_header_found_below_title_rows() {
        let grid = vec![
            header(&["HDFC Bank", "", ""]),
            header(&["Account Statement", "", ""]),
            header(&["Date", "Narration", "Withdrawal", "Deposit", "Balance"]),
        ];

        let layout = detect_layout(&grid, 10);
        assert_eq!(layout.header_row, 2);
        assert_eq!(layout.column(ColumnRole::Date), Some(0));
        assert_eq!(layout.column(ColumnRole::Description), Some(1));
        assert_eq!(layout.column(ColumnRole::Debit), Some(2));
        assert_eq!(layout.column(ColumnRole::Credit), Some(3));
        assert_eq!(layout.column(ColumnRole::Balance), Some(4));
        assert_eq!(layout.column(ColumnRole::Reference), None);
    }

    #[test]
    fn test_fallback_to_row_zero() {
        let grid = vec![
            header(&["alpha", "beta"]),
            header(&["gamma", "delta"]),
        ];

        let layout = detect_layout(&grid, 10);
        assert_eq!(layout.header_row, 0);
        assert!(layout.columns.is_empty());
    }

    #[test]
    fn test_scan_window_limits_search() {
        let mut grid = vec![header(&["noise", "noise"]); 10];
        grid.push(header(&["Date", "Particulars", "Debit", "Credit"]));

        let layout = detect_layout(&grid, 10);
        assert_eq!(
            layout.header_row, 0,
            "header past the scan window should not be found"
        );
    }

    #[test]
    fn test_role_priority_within_a_column() {
        let grid = vec![header(&["Value Date", "Transaction Details", "Dr", "Cr"])];

        let layout = detect_layout(&grid, 10);
        assert_eq!(layout.column(ColumnRole::Date), Some(0));
        assert_eq!(layout.column(ColumnRole::Description), Some(1));
        assert_eq!(layout.column(ColumnRole::Debit), Some(2));
        assert_eq!(layout.column(ColumnRole::Credit), Some(3));
    }

    #[test]
    fn test_last_column_wins_on_role_conflict() {
        let grid = vec![header(&["Date", "Balance", "Closing Balance"])];

        let layout = detect_layout(&grid, 10);
        assert_eq!(layout.column(ColumnRole::Balance), Some(2));
    }

    #[test]
    fn test_column_role_priority_order() {
        let mut sorted = ColumnRole::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, ColumnRole::ALL.to_vec());
    }
}
