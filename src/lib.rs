//! # Bank Statement Extractor
//!
//! A library for turning raw tabular grids (spreadsheet rows converted from
//! PDF or Excel bank statements) into structured statement records, and for
//! validating the financial integrity of the result.
//!
//! ## Core Concepts
//!
//! - **Grid**: Loosely typed rows of cells, as produced by a spreadsheet reader
//! - **Layout Detection**: Keyword scoring that locates the header row and maps columns to roles
//! - **Extraction**: The row walk that builds a [`Statement`] with typed transactions
//! - **Detailed Validators**: Balance and date-sequencing checks, one result per validator
//! - **Validation Report**: A single envelope with completeness, balance and date summaries
//!
//! ## Example
//!
//! ```rust,ignore
//! use bank_statement_extractor::*;
//!
//! let grid: Grid = vec![
//!     vec!["Date".into(), "Narration".into(), "Debit".into(), "Credit".into(), "Balance".into()],
//!     vec!["01-04-2024".into(), "OPENING DEPOSIT".into(), "".into(), "10,000.00".into(), "10,000.00".into()],
//!     vec!["05-04-2024".into(), "ATM WDL".into(), "2,500.00".into(), "".into(), "7,500.00".into()],
//! ];
//!
//! let processed = process_grid(&grid).unwrap();
//! assert!(processed.validation.is_valid);
//! println!("{}", processed.statement.to_json().unwrap());
//! ```

pub mod balance;
pub mod cell;
pub mod dates;
pub mod error;
pub mod extract;
pub mod issues;
pub mod layout;
pub mod metadata;
pub mod parse;
pub mod report;
pub mod statement;

pub use balance::{
    BalanceValidator, BalanceValidatorConfig, BALANCE_CONTINUITY_VALIDATOR, BALANCE_VALIDATOR,
};
pub use cell::{normalize_grid, Cell, Grid};
pub use dates::{
    DateSequencingValidator, DateValidatorConfig, DATE_PERIODS_VALIDATOR, DATE_VALIDATOR,
};
pub use error::{Result, StatementError};
pub use extract::*;
pub use issues::*;
pub use layout::{detect_layout, ColumnRole, TableLayout};
pub use metadata::{bank_from_descriptions, extract_metadata, AccountMetadata};
pub use parse::*;
pub use report::*;
pub use statement::*;

use log::info;
use serde::{Deserialize, Serialize};

/// Combined configuration for the full pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub extractor: ExtractorConfig,
    pub balance: BalanceValidatorConfig,
    pub dates: DateValidatorConfig,
}

/// Everything one grid produces: the statement, its validation report and the
/// extraction provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedStatement {
    pub statement: Statement,
    pub validation: ValidationReport,
    pub metadata: ExtractionMetadata,
}

/// Extraction and validation behind one entry point. Construction fails on an
/// inconsistent configuration; a constructed processor never fails validation,
/// only extraction can error.
#[derive(Debug, Clone, Default)]
pub struct StatementProcessor {
    extractor: StatementExtractor,
    balance: BalanceValidator,
    dates: DateSequencingValidator,
}

impl StatementProcessor {
    pub fn new() -> Self {
        StatementProcessor::default()
    }

    pub fn with_config(config: ProcessorConfig) -> Result<Self> {
        Ok(StatementProcessor {
            extractor: StatementExtractor::with_config(config.extractor)?,
            balance: BalanceValidator::with_config(config.balance)?,
            dates: DateSequencingValidator::with_config(config.dates)?,
        })
    }

    /// Extracts a statement from the grid and validates it in one pass.
    pub fn process(&self, grid: &[Vec<Cell>]) -> Result<ProcessedStatement> {
        let outcome = self.extractor.extract(grid)?;
        let validation = self.report(&outcome.statement);

        info!(
            "Processed statement ({}): {} transactions, verdict {}",
            outcome.statement.period_label(),
            outcome.statement.transactions.len(),
            validation.validation_level
        );

        Ok(ProcessedStatement {
            statement: outcome.statement,
            validation,
            metadata: outcome.metadata,
        })
    }

    /// Builds the validation report for an already-extracted statement.
    pub fn report(&self, statement: &Statement) -> ValidationReport {
        let balance = self.balance.validate_statement(statement);
        let dates = self.dates.validate_statement(statement);
        build_report(statement, &balance, &dates, self.balance.config().tolerance)
    }

    /// Runs the detailed validators and aggregates their results per
    /// validator, keyed by the account number when one is known.
    pub fn validate(&self, statement: &Statement) -> AggregatedValidationResult {
        let statement_id = statement
            .account_number
            .clone()
            .unwrap_or_else(|| "statement".to_string());
        AggregatedValidationResult::from_results(
            statement_id,
            vec![
                self.balance.validate_statement(statement),
                self.dates.validate_statement(statement),
            ],
        )
    }

    /// Cross-statement validation: balance continuity between consecutive
    /// statements and period overlap/gap checks. Input order does not matter.
    pub fn validate_statements(&self, statements: &[Statement]) -> AggregatedValidationResult {
        let statement_id = statements
            .iter()
            .find_map(|statement| statement.account_number.clone())
            .unwrap_or_else(|| "statements".to_string());
        AggregatedValidationResult::from_results(
            statement_id,
            vec![
                self.balance.validate_continuity(statements),
                self.dates.validate_periods(statements),
            ],
        )
    }
}

/// One-shot extraction and validation with default configuration.
pub fn process_grid(grid: &[Vec<Cell>]) -> Result<ProcessedStatement> {
    StatementProcessor::new().process(grid)
}

/// Extraction only, with default configuration.
pub fn extract_statement(grid: &[Vec<Cell>]) -> Result<Statement> {
    Ok(StatementExtractor::new().extract(grid)?.statement)
}

/// Detailed validation only, with default configuration.
pub fn validate_statement(statement: &Statement) -> AggregatedValidationResult {
    StatementProcessor::new().validate(statement)
}
