use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::cell::Cell;

/// Bank names matched, in order, against the header region and (as a
/// fallback) against transaction narrations.
pub const BANK_KEYWORDS: [&str; 9] = [
    "HDFC", "ICICI", "SBI", "AXIS", "KOTAK", "YES BANK", "PNB", "BOB", "BANK OF",
];

fn account_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{10,16}\b").expect("account number regex"))
}

fn ifsc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{4}0[A-Z0-9]{6}\b").expect("ifsc regex"))
}

/// Account identifiers recovered from the rows above the transaction header.
/// Nothing here is guessed: a field only fills when a pattern positively
/// matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder_name: Option<String>,
    pub branch_name: Option<String>,
    pub ifsc_code: Option<String>,
}

/// Scans the rows strictly above the header row. The first account-number
/// match sticks; IFSC and bank-name matches from later rows overwrite earlier
/// ones.
pub fn extract_metadata(grid: &[Vec<Cell>], header_row: usize) -> AccountMetadata {
    let mut metadata = AccountMetadata::default();

    for row in grid.iter().take(header_row) {
        let row_text = joined_row_text(row);

        if metadata.account_number.is_none() {
            if let Some(found) = account_number_regex().find(&row_text) {
                metadata.account_number = Some(found.as_str().to_string());
            }
        }

        if let Some(found) = ifsc_regex().find(&row_text) {
            metadata.ifsc_code = Some(found.as_str().to_string());
        }

        let upper = row_text.to_uppercase();
        for bank in BANK_KEYWORDS {
            if upper.contains(bank) {
                metadata.bank_name = Some(bank.to_string());
                break;
            }
        }
    }

    metadata
}

/// Second-chance bank identification from transaction narrations; UPI-style
/// descriptions often name the bank when the sheet has no header region.
pub fn bank_from_descriptions<'a>(descriptions: impl Iterator<Item = &'a str>) -> Option<String> {
    for description in descriptions {
        let upper = description.to_uppercase();
        for bank in BANK_KEYWORDS {
            if upper.contains(bank) {
                return Some(bank.to_string());
            }
        }
    }
    None
}

fn joined_row_text(row: &[Cell]) -> String {
    row.iter()
        .filter_map(|cell| cell.as_text())
        .collect::<Vec<_>>()
        .join(" ")
}
