use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};
use crate::issues::{IssueKind, ValidationIssue, ValidationResult};
use crate::statement::Statement;

pub const DATE_VALIDATOR: &str = "date_sequencing_validator";
pub const DATE_PERIODS_VALIDATOR: &str = "date_sequencing_validator_multi";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValidatorConfig {
    /// Largest acceptable gap in days between consecutive transaction dates.
    pub max_gap_days: i64,
    /// A statement period longer than this many days is flagged as unusual.
    pub max_period_days: i64,
    /// Largest acceptable gap in full days between consecutive statements.
    pub max_statement_gap_days: i64,
}

impl Default for DateValidatorConfig {
    fn default() -> Self {
        DateValidatorConfig {
            max_gap_days: 60,
            max_period_days: 186,
            max_statement_gap_days: 7,
        }
    }
}

/// Checks the chronology of a statement: period sanity, transaction ordering,
/// containment within the period, duplicate-looking entries and suspicious
/// gaps. Every check runs regardless of earlier findings.
#[derive(Debug, Clone, Default)]
pub struct DateSequencingValidator {
    config: DateValidatorConfig,
}

impl DateSequencingValidator {
    pub fn new() -> Self {
        DateSequencingValidator::default()
    }

    pub fn with_config(config: DateValidatorConfig) -> Result<Self> {
        for (name, days) in [
            ("max_gap_days", config.max_gap_days),
            ("max_period_days", config.max_period_days),
            ("max_statement_gap_days", config.max_statement_gap_days),
        ] {
            if days < 1 {
                return Err(StatementError::InvalidDayThreshold { name, days });
            }
        }
        Ok(DateSequencingValidator { config })
    }

    pub fn validate_statement(&self, statement: &Statement) -> ValidationResult {
        let mut result = ValidationResult::new(DATE_VALIDATOR);
        result.set_metadata("max_gap_days", self.config.max_gap_days);

        // Check 1: statement period dates
        self.check_period_dates(statement, &mut result);

        // Check 2: transaction date presence and ordering
        check_transaction_ordering(statement, &mut result);

        // Check 3: transactions within the statement period
        check_dates_in_period(statement, &mut result);

        // Check 4: duplicate-looking entries
        check_duplicates(statement, &mut result);

        // Check 5: large gaps in the transaction timeline
        self.check_transaction_gaps(statement, &mut result);

        info!(
            "Date validation complete: {} errors, {} warnings",
            result.error_count(),
            result.warning_count()
        );
        result
    }

    fn check_period_dates(&self, statement: &Statement, result: &mut ValidationResult) {
        let (Some(period_from), Some(period_to)) = (
            statement.statement_period_from,
            statement.statement_period_to,
        ) else {
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::DateOutOfRange,
                    "Missing statement period dates",
                )
                .with_field("statement_period_from/statement_period_to"),
            );
            return;
        };

        if period_to <= period_from {
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::DateChronologyError,
                    format!(
                        "Statement period invalid: End date ({period_to}) is before or \
                         same as start date ({period_from})"
                    ),
                )
                .with_field("statement_period_to")
                .with_context("period_from", period_from)
                .with_context("period_to", period_to),
            );
        }

        let today = Utc::now().date_naive();
        if period_to > today {
            result.add_issue(
                ValidationIssue::warning(
                    IssueKind::FutureDate,
                    format!("Statement period end date ({period_to}) is in the future"),
                )
                .with_field("statement_period_to")
                .with_recommendation("Verify this is correct"),
            );
        }

        let period_days = (period_to - period_from).num_days();
        if period_days > self.config.max_period_days {
            result.add_issue(
                ValidationIssue::warning(
                    IssueKind::LongPeriod,
                    format!("Statement period is unusually long: {period_days} days"),
                )
                .with_field("statement_period")
                .with_recommendation("Verify this is a valid statement"),
            );
        }
    }

    fn check_transaction_gaps(&self, statement: &Statement, result: &mut ValidationResult) {
        if statement.transactions.len() < 2 {
            return;
        }

        let mut dates: Vec<NaiveDate> = statement
            .transactions
            .iter()
            .filter_map(|t| t.date)
            .collect();
        if dates.len() < 2 {
            return;
        }
        dates.sort();

        for pair in dates.windows(2) {
            let gap = (pair[1] - pair[0]).num_days();
            if gap > self.config.max_gap_days {
                result.add_issue(
                    ValidationIssue::warning(
                        IssueKind::LargeTransactionGap,
                        format!(
                            "Large gap ({gap} days) between transactions: {} to {}",
                            pair[0], pair[1]
                        ),
                    )
                    .with_field("transactions")
                    .with_recommendation("Verify no missing transactions in this period")
                    .with_context("gap_days", gap)
                    .with_context("date_from", pair[0])
                    .with_context("date_to", pair[1]),
                );
            }
        }
    }

    /// Checks that statement periods for one account line up: sorted by start
    /// date, consecutive periods must not overlap, and gaps of more than
    /// `max_statement_gap_days` full days are flagged.
    pub fn validate_periods(&self, statements: &[Statement]) -> ValidationResult {
        let mut result = ValidationResult::new(DATE_PERIODS_VALIDATOR);
        result.set_metadata("statement_count", statements.len());

        if statements.len() < 2 {
            return result;
        }

        let mut ordered: Vec<&Statement> = statements.iter().collect();
        ordered.sort_by_key(|s| s.statement_period_from);

        for (index, pair) in ordered.windows(2).enumerate() {
            let (current, next) = (pair[0], pair[1]);
            let (Some(current_to), Some(next_from)) = (
                current.statement_period_to,
                next.statement_period_from,
            ) else {
                continue;
            };

            if current_to >= next_from {
                let overlap_days = (current_to - next_from).num_days() + 1;
                result.add_issue(
                    ValidationIssue::error(
                        IssueKind::CrossDocumentInconsistency,
                        format!(
                            "Statement periods overlap by {overlap_days} days. \
                             Statement {} ends {current_to}, Statement {} starts {next_from}",
                            index + 1,
                            index + 2
                        ),
                    )
                    .with_context("statement_1_period", current.period_label())
                    .with_context("statement_2_period", next.period_label())
                    .with_context("overlap_days", overlap_days),
                );
            }

            let gap_days = (next_from - current_to).num_days() - 1;
            if gap_days > self.config.max_statement_gap_days {
                result.add_issue(
                    ValidationIssue::warning(
                        IssueKind::StatementGap,
                        format!(
                            "Gap of {gap_days} days between statements. \
                             Statement {} ends {current_to}, Statement {} starts {next_from}",
                            index + 1,
                            index + 2
                        ),
                    )
                    .with_recommendation("Consider uploading missing statement")
                    .with_context("gap_days", gap_days)
                    .with_context("gap_from", current_to)
                    .with_context("gap_to", next_from),
                );
            }
        }

        result
    }
}

fn check_transaction_ordering(statement: &Statement, result: &mut ValidationResult) {
    let mut previous: Option<NaiveDate> = None;
    for (index, transaction) in statement.transactions.iter().enumerate() {
        let Some(current) = transaction.date else {
            let description: String = transaction.description.chars().take(50).collect();
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::DateOutOfRange,
                    format!("Transaction {}: Missing or invalid date", index + 1),
                )
                .with_field(format!("transactions[{index}].date"))
                .with_context("transaction_index", index)
                .with_context("description", description),
            );
            continue;
        };

        if let Some(previous) = previous {
            if current < previous {
                let description: String = transaction.description.chars().take(50).collect();
                result.add_issue(
                    ValidationIssue::error(
                        IssueKind::DateChronologyError,
                        format!(
                            "Transaction {}: Date out of order. \
                             Current: {current}, Previous: {previous}",
                            index + 1
                        ),
                    )
                    .with_field(format!("transactions[{index}].date"))
                    .with_context("current_date", current)
                    .with_context("previous_date", previous)
                    .with_context("current_description", description),
                );
            }
        }
        previous = Some(current);
    }
}

fn check_dates_in_period(statement: &Statement, result: &mut ValidationResult) {
    // Period problems are flagged by the period check; without bounds there
    // is nothing to contain against.
    let (Some(period_from), Some(period_to)) = (
        statement.statement_period_from,
        statement.statement_period_to,
    ) else {
        return;
    };

    for (index, transaction) in statement.transactions.iter().enumerate() {
        let Some(date) = transaction.date else {
            continue;
        };
        if date < period_from || date > period_to {
            let description: String = transaction.description.chars().take(50).collect();
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::DateOutOfRange,
                    format!(
                        "Transaction {}: Date {date} outside statement period \
                         ({period_from} to {period_to})",
                        index + 1
                    ),
                )
                .with_field(format!("transactions[{index}].date"))
                .with_context("transaction_date", date)
                .with_context("period_from", period_from)
                .with_context("period_to", period_to)
                .with_context("description", description),
            );
        }
    }
}

fn check_duplicates(statement: &Statement, result: &mut ValidationResult) {
    if statement.transactions.len() < 2 {
        return;
    }

    let mut combos: BTreeMap<(NaiveDate, String), Vec<usize>> = BTreeMap::new();
    for (index, transaction) in statement.transactions.iter().enumerate() {
        if let Some(date) = transaction.date {
            let description = transaction.description.trim().to_lowercase();
            combos.entry((date, description)).or_default().push(index);
        }
    }

    for ((date, description), indices) in &combos {
        if indices.len() > 1 {
            let snippet: String = description.chars().take(40).collect();
            result.add_issue(
                ValidationIssue::warning(
                    IssueKind::PossibleDuplicate,
                    format!(
                        "Possible duplicate transactions on {date}: \
                         \"{snippet}\" appears {} times",
                        indices.len()
                    ),
                )
                .with_field("transactions")
                .with_recommendation("Verify these are not duplicate entries")
                .with_context("date", date)
                .with_context("description", description.chars().take(100).collect::<String>())
                .with_context("indices", indices)
                .with_context("count", indices.len()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::ValidationStatus;
    use crate::statement::Transaction;
    use chrono::Days;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn transaction(date: Option<NaiveDate>, description: &str) -> Transaction {
        Transaction::new(date, description, dec!(100), Decimal::ZERO, None, None)
    }

    fn date(month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, month, day)
    }

    fn sample_statement() -> Statement {
        Statement {
            statement_period_from: date(1, 1),
            statement_period_to: date(1, 31),
            transactions: vec![
                transaction(date(1, 5), "ATM WDL"),
                transaction(date(1, 12), "GROCERIES"),
                transaction(date(1, 20), "FUEL"),
            ],
            number_of_transactions: 3,
            ..Statement::default()
        }
    }

    #[test]
    fn test_ordered_statement_passes() {
        let result = DateSequencingValidator::new().validate_statement(&sample_statement());
        assert_eq!(result.status, ValidationStatus::Passed);
        assert!(result.issues.is_empty());
        assert_eq!(result.metadata["max_gap_days"], 60);
    }

    #[test]
    fn test_missing_period_dates() {
        let mut statement = sample_statement();
        statement.statement_period_from = None;

        let result = DateSequencingValidator::new().validate_statement(&statement);
        assert_eq!(result.error_count(), 1);
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::DateOutOfRange);
        assert_eq!(
            issue.field.as_deref(),
            Some("statement_period_from/statement_period_to")
        );
    }

    #[test]
    fn test_inverted_period() {
        let mut statement = sample_statement();
        statement.statement_period_from = date(1, 31);
        statement.statement_period_to = date(1, 1);

        let result = DateSequencingValidator::new().validate_statement(&statement);
        let inverted: Vec<_> = result
            .errors()
            .filter(|i| i.kind == IssueKind::DateChronologyError)
            .collect();
        assert_eq!(inverted.len(), 1);
        assert_eq!(inverted[0].field.as_deref(), Some("statement_period_to"));
        assert_eq!(inverted[0].context["period_from"], "2024-01-31");
    }

    #[test]
    fn test_future_period_warns() {
        let today = Utc::now().date_naive();
        let statement = Statement {
            statement_period_from: Some(today),
            statement_period_to: today.checked_add_days(Days::new(30)),
            ..Statement::default()
        };

        let result = DateSequencingValidator::new().validate_statement(&statement);
        assert!(result
            .warnings()
            .any(|i| i.kind == IssueKind::FutureDate));
    }

    #[test]
    fn test_long_period_warns() {
        let statement = Statement {
            statement_period_from: date(1, 1),
            statement_period_to: NaiveDate::from_ymd_opt(2024, 12, 31),
            ..Statement::default()
        };

        let result = DateSequencingValidator::new().validate_statement(&statement);
        let issue = result
            .warnings()
            .find(|i| i.kind == IssueKind::LongPeriod)
            .expect("long period warning");
        assert!(issue.message.contains("365 days"));
    }

    #[test]
    fn test_missing_transaction_date() {
        let mut statement = sample_statement();
        statement.transactions[1].date = None;

        let result = DateSequencingValidator::new().validate_statement(&statement);
        assert_eq!(result.error_count(), 1);
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::DateOutOfRange);
        assert_eq!(issue.field.as_deref(), Some("transactions[1].date"));
        assert_eq!(issue.context["transaction_index"], 1);
    }

    #[test]
    fn test_chronology_inversion() {
        let mut statement = sample_statement();
        statement.transactions.swap(1, 2);

        let result = DateSequencingValidator::new().validate_statement(&statement);
        let inversions: Vec<_> = result
            .errors()
            .filter(|i| i.kind == IssueKind::DateChronologyError)
            .collect();
        assert_eq!(inversions.len(), 1, "one inversion, flagged once");
        assert_eq!(inversions[0].field.as_deref(), Some("transactions[2].date"));
        assert_eq!(inversions[0].context["current_date"], "2024-01-12");
        assert_eq!(inversions[0].context["previous_date"], "2024-01-20");
    }

    #[test]
    fn test_date_outside_period() {
        let mut statement = sample_statement();
        statement.transactions[2].date = date(2, 5);

        let result = DateSequencingValidator::new().validate_statement(&statement);
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::DateOutOfRange);
        assert_eq!(issue.context["transaction_date"], "2024-02-05");
        assert_eq!(issue.context["period_to"], "2024-01-31");
    }

    #[test]
    fn test_possible_duplicates() {
        let mut statement = sample_statement();
        statement.transactions[1] = transaction(date(1, 5), "  atm wdl ");

        let result = DateSequencingValidator::new().validate_statement(&statement);
        assert_eq!(result.status, ValidationStatus::Warnings);
        let issue = result
            .warnings()
            .find(|i| i.kind == IssueKind::PossibleDuplicate)
            .expect("duplicate warning");
        assert_eq!(issue.context["indices"], serde_json::json!([0, 1]));
        assert_eq!(issue.context["count"], 2);
        assert_eq!(issue.context["description"], "atm wdl");
    }

    #[test]
    fn test_large_transaction_gap() {
        let statement = Statement {
            statement_period_from: date(1, 1),
            statement_period_to: date(3, 31),
            transactions: vec![
                transaction(date(1, 1), "OPENING SPEND"),
                transaction(date(3, 15), "NEXT SPEND"),
            ],
            number_of_transactions: 2,
            ..Statement::default()
        };

        let result = DateSequencingValidator::new().validate_statement(&statement);
        let issue = result
            .warnings()
            .find(|i| i.kind == IssueKind::LargeTransactionGap)
            .expect("gap warning");
        assert_eq!(issue.context["gap_days"], 74);
        assert_eq!(issue.context["date_from"], "2024-01-01");
        assert_eq!(issue.context["date_to"], "2024-03-15");
    }

    #[test]
    fn test_period_overlap() {
        let first = Statement {
            statement_period_from: date(1, 1),
            statement_period_to: date(1, 31),
            ..Statement::default()
        };
        let second = Statement {
            statement_period_from: date(1, 25),
            statement_period_to: date(2, 28),
            ..Statement::default()
        };

        let result = DateSequencingValidator::new().validate_periods(&[first, second]);
        assert_eq!(result.error_count(), 1);
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::CrossDocumentInconsistency);
        assert_eq!(issue.context["overlap_days"], 7);
    }

    #[test]
    fn test_period_gap() {
        let first = Statement {
            statement_period_from: date(1, 1),
            statement_period_to: date(1, 31),
            ..Statement::default()
        };
        let second = Statement {
            statement_period_from: date(2, 15),
            statement_period_to: date(3, 14),
            ..Statement::default()
        };

        // Out of order on purpose; the validator sorts by period start.
        let result = DateSequencingValidator::new().validate_periods(&[second, first]);
        assert_eq!(result.status, ValidationStatus::Warnings);
        let issue = result.warnings().next().expect("one warning");
        assert_eq!(issue.kind, IssueKind::StatementGap);
        assert_eq!(issue.context["gap_days"], 14);
        assert_eq!(issue.context["gap_from"], "2024-01-31");
        assert_eq!(issue.context["gap_to"], "2024-02-15");
    }

    #[test]
    fn test_adjacent_periods_pass() {
        let first = Statement {
            statement_period_from: date(1, 1),
            statement_period_to: date(1, 31),
            ..Statement::default()
        };
        let second = Statement {
            statement_period_from: date(2, 1),
            statement_period_to: date(2, 29),
            ..Statement::default()
        };

        let result = DateSequencingValidator::new().validate_periods(&[first, second]);
        assert_eq!(result.status, ValidationStatus::Passed);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_single_statement_periods_pass_quietly() {
        let result = DateSequencingValidator::new().validate_periods(&[sample_statement()]);
        assert_eq!(result.status, ValidationStatus::Passed);
        assert!(result.issues.is_empty());
        assert_eq!(result.metadata["statement_count"], 1);
    }

    #[test]
    fn test_threshold_validation() {
        let config = DateValidatorConfig {
            max_gap_days: 0,
            ..DateValidatorConfig::default()
        };
        let error = DateSequencingValidator::with_config(config).err().expect("rejected");
        assert!(matches!(
            error,
            StatementError::InvalidDayThreshold {
                name: "max_gap_days",
                days: 0
            }
        ));
    }
}
