use chrono::{Datelike, NaiveDate};
use log::warn;
use regex::Regex;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::cell::Cell;

/// Tokens that mark a cell as repeated header text rather than a data value.
/// Statements frequently restate the header mid-sheet (page breaks), and those
/// rows must not be mistaken for transactions.
const HEADER_TOKENS: [&str; 4] = ["date", "tran", "txn", "transaction"];

/// Day-before-month formats tried first, the locale preference of the
/// statements this parser targets. Ambiguous all-numeric dates resolve
/// day-first here; month-first forms only match below when the day
/// exceeds 12.
const DAY_FIRST_FORMATS: [&str; 6] = [
    "%d/%m/%Y", "%d.%m.%Y", "%d %m %Y", "%d %b %Y", "%d %B %Y", "%d/%b/%Y",
];

/// The explicit fallback formats, tried in order after the day-first set.
const EXPLICIT_FORMATS: [&str; 7] = [
    "%d-%m-%Y", "%m/%d/%Y", "%Y-%m-%d", "%d/%m/%Y", "%d-%b-%Y", "%d-%B-%Y", "%Y%m%d",
];

fn date_fragment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})[-/](\d{1,2})[-/](\d{2,4})").expect("date regex"))
}

/// Parses a date-like cell into a canonical calendar date.
///
/// Structured date cells are used directly; everything else is rendered to
/// text and run through the string fallback chain. Returns `None` when no
/// stage succeeds; the caller tallies the skip, it is never an error.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Empty => None,
        Cell::Date(date) => Some(*date),
        other => parse_date_text(&other.as_text()?),
    }
}

/// The string stages of the date fallback chain: header-token rejection,
/// day-first formats, the explicit format list, then regex extraction of a
/// `D-M-Y` fragment with a two-digit-year pivot at 50.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    if HEADER_TOKENS.iter().any(|token| lowered.contains(token)) {
        return None;
    }

    for format in DAY_FIRST_FORMATS.iter().chain(EXPLICIT_FORMATS.iter()) {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            // Two-digit years slip through %Y as literal years 0-99; those
            // strings belong to the pivot stage below.
            if date.year() >= 1000 {
                return Some(date);
            }
        }
    }

    if let Some(captures) = date_fragment_regex().captures(trimmed) {
        let day: u32 = captures[1].parse().ok()?;
        let month: u32 = captures[2].parse().ok()?;
        let year_text = &captures[3];
        let mut year: i32 = year_text.parse().ok()?;
        if year_text.len() == 2 {
            year = if year < 50 { 2000 + year } else { 1900 + year };
        }
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    warn!("Could not parse date: '{}'", text);
    None
}

/// Parses an amount cell to a signed decimal. Empty and unparseable cells
/// yield zero, matching how debit/credit columns treat blanks.
pub fn parse_amount(cell: &Cell) -> Decimal {
    parse_amount_opt(cell).unwrap_or(Decimal::ZERO)
}

/// Parses a balance cell. Unlike amounts, blanks stay absent: fabricating a
/// zero balance would turn every later progression comparison into a false
/// mismatch.
pub fn parse_balance(cell: &Cell) -> Option<Decimal> {
    parse_amount_opt(cell)
}

fn parse_amount_opt(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Empty => None,
        Cell::Number(value) => Decimal::from_f64(*value),
        Cell::Date(_) => None,
        Cell::Text(text) => parse_amount_text(text),
    }
}

/// Parses an amount string: thousands separators and currency markers are
/// stripped, `(123)`-style parentheses negate.
pub fn parse_amount_text(text: &str) -> Option<Decimal> {
    let mut cleaned = text
        .replace(',', "")
        .replace('₹', "")
        .replace("Rs", "")
        .replace("INR", "")
        .replace('$', "")
        .trim()
        .to_string();

    if cleaned.contains('(') {
        cleaned = cleaned.replace('(', "-").replace(')', "");
    }

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}
