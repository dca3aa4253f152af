use chrono::{NaiveDate, Utc};
use log::info;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::balance::quantize;
use crate::error::Result;
use crate::issues::{IssueKind, Severity, ValidationIssue, ValidationResult};
use crate::statement::Statement;

/// Overall verdict for a statement. Any error escalates to `CriticalErrors`,
/// warnings alone stay at `Warnings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationLevel {
    Passed,
    Warnings,
    CriticalErrors,
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValidationLevel::Passed => "PASSED",
            ValidationLevel::Warnings => "WARNINGS",
            ValidationLevel::CriticalErrors => "CRITICAL_ERRORS",
        };
        f.write_str(label)
    }
}

/// Presence of the required statement fields and the declared-vs-actual
/// transaction count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompletenessCheck {
    pub required_fields_present: bool,
    pub missing_fields: Vec<String>,
    pub transaction_count_match: bool,
    pub declared_count: usize,
    pub actual_count: usize,
}

/// Arithmetic summary of the statement's balances, recomputed from the
/// transaction rows rather than the declared totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BalanceCheck {
    pub is_balanced: bool,
    pub opening_balance: Option<Decimal>,
    pub closing_balance: Option<Decimal>,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub expected_closing: Option<Decimal>,
    pub difference: Option<Decimal>,
    pub tolerance: Decimal,
    pub progression_valid: bool,
}

/// Summary of the statement's date health: period validity, transaction
/// ordering and any dates in the future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DateCheck {
    pub period_dates_valid: bool,
    pub period_from: Option<NaiveDate>,
    pub period_to: Option<NaiveDate>,
    pub chronological_order: bool,
    pub future_dates_count: usize,
    pub future_dates: Vec<NaiveDate>,
}

/// Single validation envelope for one statement: the three check summaries
/// plus the full issue list, ordered completeness, then balance, then dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub validation_level: ValidationLevel,
    pub balance_check: BalanceCheck,
    pub date_check: DateCheck,
    pub completeness_check: CompletenessCheck,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
            .count()
    }
}

/// Builds the report from a statement and the detailed validator results.
/// Completeness issues are generated here; balance and date issues are carried
/// over from the detailed results, with per-transaction future-date warnings
/// (which only the report tracks) appended to the date section.
pub fn build_report(
    statement: &Statement,
    balance: &ValidationResult,
    dates: &ValidationResult,
    tolerance: Decimal,
) -> ValidationReport {
    let (completeness_check, mut issues) = check_completeness(statement);
    let balance_check = summarize_balance(statement, balance, tolerance);
    let (date_check, future_issues) = summarize_dates(statement);

    issues.extend(balance.issues.iter().cloned());
    issues.extend(dates.issues.iter().cloned());
    issues.extend(future_issues);

    let has_errors = issues.iter().any(|issue| issue.severity == Severity::Error);
    let has_warnings = issues
        .iter()
        .any(|issue| issue.severity == Severity::Warning);
    let validation_level = if has_errors {
        ValidationLevel::CriticalErrors
    } else if has_warnings {
        ValidationLevel::Warnings
    } else {
        ValidationLevel::Passed
    };

    info!(
        "Validation complete: {} ({} issues found)",
        validation_level,
        issues.len()
    );

    ValidationReport {
        is_valid: !has_errors,
        validation_level,
        balance_check,
        date_check,
        completeness_check,
        issues,
    }
}

fn check_completeness(statement: &Statement) -> (CompletenessCheck, Vec<ValidationIssue>) {
    let absences = [
        (
            "statement_period_from",
            statement.statement_period_from.is_none(),
        ),
        (
            "statement_period_to",
            statement.statement_period_to.is_none(),
        ),
        ("opening_balance", statement.opening_balance.is_none()),
        ("closing_balance", statement.closing_balance.is_none()),
    ];

    let mut issues = Vec::new();
    let mut missing_fields = Vec::new();
    for (field, absent) in absences {
        if absent {
            issues.push(
                ValidationIssue::error(
                    IssueKind::MissingRequiredField,
                    format!("Required field missing: {field}"),
                )
                .with_field(field),
            );
            missing_fields.push(field.to_string());
        }
    }

    let declared_count = statement.number_of_transactions;
    let actual_count = statement.transactions.len();
    let transaction_count_match = declared_count == actual_count;
    if !transaction_count_match {
        issues.push(
            ValidationIssue::warning(
                IssueKind::TransactionCountMismatch,
                format!(
                    "Transaction count mismatch: declared {declared_count}, actual {actual_count}"
                ),
            )
            .with_field("number_of_transactions")
            .with_context("declared", declared_count)
            .with_context("actual", actual_count),
        );
    }

    let check = CompletenessCheck {
        required_fields_present: missing_fields.is_empty(),
        missing_fields,
        transaction_count_match,
        declared_count,
        actual_count,
    };
    (check, issues)
}

fn summarize_balance(
    statement: &Statement,
    detailed: &ValidationResult,
    tolerance: Decimal,
) -> BalanceCheck {
    let total_credits = quantize(statement.transactions.iter().map(|t| t.credit).sum());
    let total_debits = quantize(statement.transactions.iter().map(|t| t.debit).sum());
    let opening_balance = statement.opening_balance.map(quantize);
    let closing_balance = statement.closing_balance.map(quantize);
    let expected_closing = opening_balance.map(|opening| opening + total_credits - total_debits);
    let difference = match (expected_closing, closing_balance) {
        (Some(expected), Some(closing)) => Some((closing - expected).abs()),
        _ => None,
    };
    let progression_valid = !detailed
        .issues
        .iter()
        .any(|issue| issue.kind == IssueKind::BalanceProgressionError);

    BalanceCheck {
        is_balanced: difference.is_some_and(|diff| diff <= tolerance),
        opening_balance,
        closing_balance,
        total_credits,
        total_debits,
        expected_closing,
        difference,
        tolerance,
        progression_valid,
    }
}

fn summarize_dates(statement: &Statement) -> (DateCheck, Vec<ValidationIssue>) {
    let today = Utc::now().date_naive();
    let mut issues = Vec::new();
    let mut future_dates = Vec::new();
    let mut chronological_order = true;
    let mut previous: Option<NaiveDate> = None;

    for (index, transaction) in statement.transactions.iter().enumerate() {
        let Some(date) = transaction.date else {
            continue;
        };
        if date > today {
            future_dates.push(date);
            issues.push(
                ValidationIssue::warning(
                    IssueKind::FutureDate,
                    format!("Transaction {}: Future date detected - {}", index + 1, date),
                )
                .with_field(format!("transactions[{index}].date"))
                .with_context("transaction_index", index)
                .with_context("transaction_date", date.to_string()),
            );
        }
        if previous.is_some_and(|prev| date < prev) {
            chronological_order = false;
        }
        previous = Some(date);
    }

    let period_from = statement.statement_period_from;
    let period_to = statement.statement_period_to;
    let period_dates_valid = match (period_from, period_to) {
        (Some(from), Some(to)) => from <= to,
        _ => false,
    };

    let check = DateCheck {
        period_dates_valid,
        period_from,
        period_to,
        chronological_order,
        future_dates_count: future_dates.len(),
        future_dates,
    };
    (check, issues)
}

/// JSON Schema for the report envelope, for collaborators that consume
/// validation payloads.
pub fn validation_report_schema() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(schemars::schema_for!(
        ValidationReport
    ))?)
}
