use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cell::{normalize_grid, Cell};
use crate::error::{Result, StatementError};
use crate::layout::{detect_layout, ColumnRole, TableLayout};
use crate::metadata::{bank_from_descriptions, extract_metadata};
use crate::parse::{parse_amount, parse_balance, parse_date};
use crate::statement::{Statement, Transaction, DEFAULT_CURRENCY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// How many leading rows to scan for the header before falling back to
    /// row 0.
    pub header_scan_rows: usize,
    /// Currency code stamped on every extracted statement.
    pub currency: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            header_scan_rows: 10,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Rows dropped during the transaction walk, by reason. Diagnostics only;
/// skipped rows never fail an extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipTally {
    pub empty_row: usize,
    pub no_date: usize,
    pub parse_fail: usize,
}

impl SkipTally {
    pub fn total(&self) -> usize {
        self.empty_row + self.no_date + self.parse_fail
    }
}

/// Provenance of one extraction run. Indices refer to the normalized grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    pub total_rows: usize,
    pub header_row: usize,
    pub converter: String,
    pub skipped: SkipTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    pub statement: Statement,
    pub metadata: ExtractionMetadata,
}

/// Turns a raw spreadsheet grid into a [`Statement`]. Stateless between
/// calls; one extractor can serve any number of grids.
#[derive(Debug, Clone, Default)]
pub struct StatementExtractor {
    config: ExtractorConfig,
}

impl StatementExtractor {
    pub fn new() -> Self {
        StatementExtractor::default()
    }

    pub fn with_config(config: ExtractorConfig) -> Result<Self> {
        if config.header_scan_rows == 0 {
            return Err(StatementError::InvalidScanWindow(config.header_scan_rows));
        }
        Ok(StatementExtractor { config })
    }

    pub fn extract(&self, grid: &[Vec<Cell>]) -> Result<ExtractionOutcome> {
        // 1. Normalize: drop rows and columns with no content at all
        let grid = normalize_grid(grid);
        if grid.is_empty() {
            return Err(StatementError::EmptyGrid);
        }
        info!("Converting grid with {} rows", grid.len());

        // 2. Locate the header row and map column roles
        let layout = detect_layout(&grid, self.config.header_scan_rows);

        // 3. Account metadata from the rows above the header
        let mut account = extract_metadata(&grid, layout.header_row);

        // 4. Walk the rows below the header
        let date_col = layout.column(ColumnRole::Date).unwrap_or(0);
        let mut tally = SkipTally::default();
        let mut transactions = Vec::new();
        for row in grid.iter().skip(layout.header_row + 1) {
            if row.iter().all(Cell::is_empty) {
                tally.empty_row += 1;
                continue;
            }
            let Some(date_cell) = row.get(date_col).filter(|cell| !cell.is_empty()) else {
                tally.no_date += 1;
                continue;
            };
            let Some(date) = parse_date(date_cell) else {
                tally.parse_fail += 1;
                continue;
            };

            let description = role_cell(row, &layout, ColumnRole::Description)
                .and_then(Cell::as_text)
                .map(|text| text.trim().to_string())
                .unwrap_or_default();
            let debit = role_cell(row, &layout, ColumnRole::Debit)
                .map(parse_amount)
                .unwrap_or(Decimal::ZERO);
            let credit = role_cell(row, &layout, ColumnRole::Credit)
                .map(parse_amount)
                .unwrap_or(Decimal::ZERO);
            let balance = role_cell(row, &layout, ColumnRole::Balance).and_then(parse_balance);
            let reference = role_cell(row, &layout, ColumnRole::Reference)
                .and_then(Cell::as_text)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());

            transactions.push(Transaction::new(
                Some(date),
                description,
                debit,
                credit,
                balance,
                reference,
            ));
        }

        if tally.total() > 0 {
            debug!(
                "Skipped rows: {} empty, {} without date, {} unparseable",
                tally.empty_row, tally.no_date, tally.parse_fail
            );
        }

        // 5. Bank identity often only appears inside UPI-style narrations
        if account.bank_name.is_none() {
            account.bank_name =
                bank_from_descriptions(transactions.iter().map(|t| t.description.as_str()));
        }

        // 6. Period, totals and balances from the transaction sequence
        let summary = summarize(&transactions);

        info!(
            "Extracted {} transactions from {} rows ({} skipped)",
            transactions.len(),
            grid.len(),
            tally.total()
        );

        let metadata = ExtractionMetadata {
            total_rows: grid.len(),
            header_row: layout.header_row,
            converter: "rule_based".to_string(),
            skipped: tally,
        };
        let statement = Statement {
            bank_name: account.bank_name,
            account_number: account.account_number,
            account_holder_name: account.account_holder_name,
            branch_name: account.branch_name,
            ifsc_code: account.ifsc_code,
            currency: self.config.currency.clone(),
            statement_period_from: summary.period_from,
            statement_period_to: summary.period_to,
            opening_balance: summary.opening_balance,
            closing_balance: summary.closing_balance,
            total_credits: summary.total_credits,
            total_debits: summary.total_debits,
            number_of_transactions: transactions.len(),
            transactions,
        };

        Ok(ExtractionOutcome {
            statement,
            metadata,
        })
    }
}

fn role_cell<'a>(row: &'a [Cell], layout: &TableLayout, role: ColumnRole) -> Option<&'a Cell> {
    layout.column(role).and_then(|index| row.get(index))
}

struct Summary {
    period_from: Option<NaiveDate>,
    period_to: Option<NaiveDate>,
    opening_balance: Option<Decimal>,
    closing_balance: Option<Decimal>,
    total_credits: Decimal,
    total_debits: Decimal,
}

/// Derives the period and balance summary from the sequence as extracted
/// (source order, never re-sorted). The opening balance is back-solved from
/// the first row because sheets rarely state it outright.
fn summarize(transactions: &[Transaction]) -> Summary {
    let (Some(first), Some(last)) = (transactions.first(), transactions.last()) else {
        return Summary {
            period_from: None,
            period_to: None,
            opening_balance: Some(Decimal::ZERO),
            closing_balance: Some(Decimal::ZERO),
            total_credits: Decimal::ZERO,
            total_debits: Decimal::ZERO,
        };
    };

    let total_credits: Decimal = transactions.iter().map(|t| t.credit).sum();
    let total_debits: Decimal = transactions.iter().map(|t| t.debit).sum();
    let total_credits = total_credits.round_dp(2);
    let total_debits = total_debits.round_dp(2);

    let opening_balance = first
        .balance
        .map(|balance| (balance - first.credit + first.debit).round_dp(2));
    let closing_balance = last.balance.map(|balance| balance.round_dp(2));

    // Cross-derive the opening from the closing side; a disagreement means
    // some stated balance is inconsistent with the flows, which the balance
    // validator will pin down.
    if let (Some(opening), Some(closing)) = (opening_balance, closing_balance) {
        let implied = closing - total_credits + total_debits;
        if (opening - implied).abs() > Decimal::new(1, 2) {
            warn!(
                "Back-solved opening balance {} disagrees with closing-implied {}",
                opening, implied
            );
        }
    }

    Summary {
        period_from: first.date,
        period_to: last.date,
        opening_balance,
        closing_balance,
        total_credits,
        total_debits,
    }
}
