use log::info;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatementError};
use crate::issues::{IssueKind, ValidationIssue, ValidationResult};
use crate::statement::Statement;

pub const BALANCE_VALIDATOR: &str = "balance_validator";
pub const BALANCE_CONTINUITY_VALIDATOR: &str = "balance_validator_multi";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceValidatorConfig {
    /// Acceptable absolute difference between stated and computed amounts,
    /// covering rounding done by the bank.
    pub tolerance: Decimal,
}

impl Default for BalanceValidatorConfig {
    fn default() -> Self {
        BalanceValidatorConfig {
            tolerance: Decimal::new(1, 2),
        }
    }
}

/// Checks that a statement's balances are arithmetically consistent:
/// opening + credits - debits must reach the closing balance, every stated
/// per-row balance must follow from the previous one, and the declared totals
/// must match the transaction sums. Every check runs regardless of earlier
/// findings.
#[derive(Debug, Clone, Default)]
pub struct BalanceValidator {
    config: BalanceValidatorConfig,
}

impl BalanceValidator {
    pub fn new() -> Self {
        BalanceValidator::default()
    }

    pub fn with_config(config: BalanceValidatorConfig) -> Result<Self> {
        if config.tolerance < Decimal::ZERO {
            return Err(StatementError::InvalidTolerance(config.tolerance));
        }
        Ok(BalanceValidator { config })
    }

    pub fn config(&self) -> BalanceValidatorConfig {
        self.config
    }

    pub fn validate_statement(&self, statement: &Statement) -> ValidationResult {
        let mut result = ValidationResult::new(BALANCE_VALIDATOR);
        result.set_metadata("tolerance", self.config.tolerance);

        // Check 1: closing = opening + credits - debits
        self.check_reconciliation(statement, &mut result);

        // Check 2: per-transaction balance progression
        self.check_progression(statement, &mut result);

        // Check 3: declared totals against transaction sums
        self.check_totals(statement, &mut result);

        info!(
            "Balance validation complete: {} errors, {} warnings",
            result.error_count(),
            result.warning_count()
        );
        result
    }

    fn check_reconciliation(&self, statement: &Statement, result: &mut ValidationResult) {
        let (Some(opening), Some(closing)) = (
            statement.opening_balance.map(quantize),
            statement.closing_balance.map(quantize),
        ) else {
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::MissingBalance,
                    "Missing opening or closing balance",
                )
                .with_field("opening_balance/closing_balance"),
            );
            return;
        };

        let total_credits = quantize(statement.total_credits);
        let total_debits = quantize(statement.total_debits);
        let expected_closing = opening + total_credits - total_debits;
        let difference = (closing - expected_closing).abs();

        if difference > self.config.tolerance {
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::BalanceMismatch,
                    format!(
                        "Closing balance mismatch. Expected: {expected_closing:.2}, \
                         Actual: {closing:.2}, Difference: {difference:.2}"
                    ),
                )
                .with_field("closing_balance")
                .with_expected(expected_closing)
                .with_actual(closing)
                .with_context("opening_balance", opening)
                .with_context("total_credits", total_credits)
                .with_context("total_debits", total_debits)
                .with_context(
                    "calculation",
                    format!("{opening:.2} + {total_credits:.2} - {total_debits:.2}"),
                ),
            );
        } else if difference > Decimal::ZERO {
            result.add_issue(
                ValidationIssue::warning(
                    IssueKind::MinorBalanceDifference,
                    format!("Minor rounding difference in closing balance: {difference:.2}"),
                )
                .with_field("closing_balance")
                .with_recommendation("Verify rounding rules with bank"),
            );
        }
    }

    fn check_progression(&self, statement: &Statement, result: &mut ValidationResult) {
        if statement.transactions.is_empty() {
            result.add_issue(
                ValidationIssue::warning(
                    IssueKind::NoTransactions,
                    "No transactions found in statement",
                )
                .with_recommendation("Verify the transaction table was detected correctly"),
            );
            return;
        }

        // Missing opening balance is already flagged by the reconciliation
        // check; the progression walk has no anchor without it.
        let Some(opening) = statement.opening_balance.map(quantize) else {
            return;
        };

        let mut running = opening;
        for (index, transaction) in statement.transactions.iter().enumerate() {
            let debit = quantize(transaction.debit);
            let credit = quantize(transaction.credit);
            let expected = if credit > Decimal::ZERO {
                running + credit
            } else {
                running - debit
            };

            let Some(stated) = transaction.balance.map(quantize) else {
                running = expected;
                continue;
            };

            let difference = (stated - expected).abs();
            if difference > self.config.tolerance {
                let description: String = transaction.description.chars().take(50).collect();
                result.add_issue(
                    ValidationIssue::error(
                        IssueKind::BalanceProgressionError,
                        format!(
                            "Transaction {}: Balance mismatch. Expected: {expected:.2}, \
                             Stated: {stated:.2}",
                            index + 1
                        ),
                    )
                    .with_field(format!("transactions[{index}].balance"))
                    .with_expected(expected)
                    .with_actual(stated)
                    .with_context("transaction_index", index)
                    .with_context("transaction_date", transaction.date)
                    .with_context("description", description)
                    .with_context("debit", debit)
                    .with_context("credit", credit),
                );
            }
            // Resynchronize on the stated value either way, so one bad row
            // cannot cascade errors through the rest of the walk.
            running = stated;
        }
    }

    fn check_totals(&self, statement: &Statement, result: &mut ValidationResult) {
        if statement.transactions.is_empty() {
            return;
        }

        let stated_credits = quantize(statement.total_credits);
        let stated_debits = quantize(statement.total_debits);
        let actual_credits: Decimal = statement
            .transactions
            .iter()
            .map(|t| quantize(t.credit))
            .sum();
        let actual_debits: Decimal = statement
            .transactions
            .iter()
            .map(|t| quantize(t.debit))
            .sum();

        if (stated_credits - actual_credits).abs() > self.config.tolerance {
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::CalculationError,
                    format!(
                        "Total credits mismatch. Stated: {stated_credits:.2}, \
                         Sum of transactions: {actual_credits:.2}"
                    ),
                )
                .with_field("total_credits")
                .with_expected(actual_credits)
                .with_actual(stated_credits),
            );
        }
        if (stated_debits - actual_debits).abs() > self.config.tolerance {
            result.add_issue(
                ValidationIssue::error(
                    IssueKind::CalculationError,
                    format!(
                        "Total debits mismatch. Stated: {stated_debits:.2}, \
                         Sum of transactions: {actual_debits:.2}"
                    ),
                )
                .with_field("total_debits")
                .with_expected(actual_debits)
                .with_actual(stated_debits),
            );
        }
    }

    /// Checks that consecutive statements for one account hand over cleanly:
    /// each closing balance must equal the next opening balance. Statements
    /// are compared in period-end order.
    pub fn validate_continuity(&self, statements: &[Statement]) -> ValidationResult {
        let mut result = ValidationResult::new(BALANCE_CONTINUITY_VALIDATOR);
        result.set_metadata("statement_count", statements.len());

        if statements.len() < 2 {
            result.add_issue(
                ValidationIssue::warning(
                    IssueKind::InsufficientStatements,
                    "Need at least 2 statements to validate continuity",
                )
                .with_recommendation("Upload sequential statements for the same account"),
            );
            return result;
        }

        let mut ordered: Vec<&Statement> = statements.iter().collect();
        ordered.sort_by_key(|s| s.statement_period_to);

        for (index, pair) in ordered.windows(2).enumerate() {
            let (current, next) = (pair[0], pair[1]);
            let (Some(closing), Some(opening)) = (
                current.closing_balance.map(quantize),
                next.opening_balance.map(quantize),
            ) else {
                continue;
            };

            let difference = (closing - opening).abs();
            if difference > self.config.tolerance {
                result.add_issue(
                    ValidationIssue::error(
                        IssueKind::CrossDocumentInconsistency,
                        format!(
                            "Balance discontinuity between statements. \
                             Statement {} closing: {closing:.2}, Statement {} opening: {opening:.2}",
                            index + 1,
                            index + 2
                        ),
                    )
                    .with_context("statement_1_period", current.period_label())
                    .with_context("statement_2_period", next.period_label())
                    .with_context("difference", difference),
                );
            }
        }

        result
    }
}

/// Rounds to two decimal places with half-up midpoints, the convention bank
/// statements themselves use.
pub(crate) fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issues::{Severity, ValidationStatus};
    use crate::statement::Transaction;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 1, day)
    }

    fn sample_statement() -> Statement {
        Statement {
            statement_period_from: date(1),
            statement_period_to: date(2),
            opening_balance: Some(dec!(10000)),
            closing_balance: Some(dec!(13000)),
            total_credits: dec!(5000),
            total_debits: dec!(2000),
            number_of_transactions: 2,
            transactions: vec![
                Transaction::new(
                    date(1),
                    "SALARY CREDIT",
                    Decimal::ZERO,
                    dec!(5000),
                    Some(dec!(15000)),
                    None,
                ),
                Transaction::new(
                    date(2),
                    "ATM WDL",
                    dec!(2000),
                    Decimal::ZERO,
                    Some(dec!(13000)),
                    None,
                ),
            ],
            ..Statement::default()
        }
    }

    #[test]
    fn test_consistent_statement_passes() {
        let result = BalanceValidator::new().validate_statement(&sample_statement());
        assert_eq!(result.status, ValidationStatus::Passed);
        assert!(result.issues.is_empty());
        assert!(result.metadata.contains_key("tolerance"));
    }

    #[test]
    fn test_closing_balance_mismatch() {
        let mut statement = sample_statement();
        statement.closing_balance = Some(dec!(9000));
        // Keep the progression consistent so only reconciliation fires.
        statement.transactions[1].balance = Some(dec!(13000));

        let result = BalanceValidator::new().validate_statement(&statement);
        assert_eq!(result.error_count(), 1);
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::BalanceMismatch);
        assert_eq!(issue.field.as_deref(), Some("closing_balance"));
        assert_eq!(issue.expected, Some(dec!(13000)));
        assert_eq!(issue.actual, Some(dec!(9000)));
        assert_eq!(
            issue.context["calculation"],
            "10000.00 + 5000.00 - 2000.00"
        );
    }

    #[test]
    fn test_minor_difference_is_a_warning() {
        let mut statement = sample_statement();
        statement.closing_balance = Some(dec!(13000.01));
        statement.transactions[1].balance = Some(dec!(13000.01));

        let result = BalanceValidator::new().validate_statement(&statement);
        assert_eq!(result.status, ValidationStatus::Warnings);
        assert!(result.passed);
        let issue = result.warnings().next().expect("one warning");
        assert_eq!(issue.kind, IssueKind::MinorBalanceDifference);
        assert!(issue.recommendation.is_some());
    }

    #[test]
    fn test_progression_error_does_not_taint_reconciliation() {
        let mut statement = sample_statement();
        statement.transactions[1].balance = Some(dec!(9000));

        let result = BalanceValidator::new().validate_statement(&statement);
        assert_eq!(result.error_count(), 1, "reconciliation still passes");
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::BalanceProgressionError);
        assert_eq!(issue.field.as_deref(), Some("transactions[1].balance"));
        assert_eq!(issue.context["transaction_index"], 1);
        assert_eq!(issue.context["transaction_date"], "2024-01-02");
    }

    #[test]
    fn test_progression_resynchronizes_after_divergence() {
        let mut statement = sample_statement();
        statement.transactions[1].balance = Some(dec!(9000));
        statement.transactions.push(Transaction::new(
            date(3),
            "COFFEE",
            dec!(100),
            Decimal::ZERO,
            Some(dec!(8900)),
            None,
        ));
        statement.number_of_transactions = 3;
        statement.closing_balance = Some(dec!(8900));
        statement.total_debits = dec!(2100);

        let result = BalanceValidator::new().validate_statement(&statement);
        let progression_errors: Vec<_> = result
            .errors()
            .filter(|i| i.kind == IssueKind::BalanceProgressionError)
            .collect();
        assert_eq!(
            progression_errors.len(),
            1,
            "rows after the divergence follow the stated balance"
        );
        assert_eq!(progression_errors[0].context["transaction_index"], 1);
    }

    #[test]
    fn test_progression_carries_computed_balance() {
        let mut statement = sample_statement();
        statement.transactions[0].balance = None;

        let result = BalanceValidator::new().validate_statement(&statement);
        assert_eq!(result.status, ValidationStatus::Passed);
    }

    #[test]
    fn test_missing_opening_balance() {
        let mut statement = sample_statement();
        statement.opening_balance = None;

        let result = BalanceValidator::new().validate_statement(&statement);
        assert_eq!(result.status, ValidationStatus::Failed);
        assert_eq!(result.error_count(), 1);
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::MissingBalance);
        assert_eq!(
            issue.field.as_deref(),
            Some("opening_balance/closing_balance")
        );
    }

    #[test]
    fn test_totals_mismatch() {
        let mut statement = sample_statement();
        statement.total_credits = dec!(5100);
        // Reconciliation now disagrees too; look only at the totals check.
        let result = BalanceValidator::new().validate_statement(&statement);
        let totals: Vec<_> = result
            .errors()
            .filter(|i| i.kind == IssueKind::CalculationError)
            .collect();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].field.as_deref(), Some("total_credits"));
        assert_eq!(totals[0].expected, Some(dec!(5000)));
        assert_eq!(totals[0].actual, Some(dec!(5100)));
    }

    #[test]
    fn test_empty_statement_warns() {
        let statement = Statement {
            opening_balance: Some(Decimal::ZERO),
            closing_balance: Some(Decimal::ZERO),
            ..Statement::default()
        };

        let result = BalanceValidator::new().validate_statement(&statement);
        assert_eq!(result.status, ValidationStatus::Warnings);
        let issue = result.warnings().next().expect("one warning");
        assert_eq!(issue.kind, IssueKind::NoTransactions);
    }

    #[test]
    fn test_continuity_passes_for_matching_handover() {
        let first = Statement {
            statement_period_from: date(1),
            statement_period_to: date(31),
            opening_balance: Some(dec!(10000)),
            closing_balance: Some(dec!(13000)),
            ..Statement::default()
        };
        let second = Statement {
            statement_period_from: NaiveDate::from_ymd_opt(2024, 2, 1),
            statement_period_to: NaiveDate::from_ymd_opt(2024, 2, 29),
            opening_balance: Some(dec!(13000)),
            closing_balance: Some(dec!(12000)),
            ..Statement::default()
        };

        // Deliberately out of order; the validator sorts by period end.
        let result = BalanceValidator::new().validate_continuity(&[second, first]);
        assert_eq!(result.status, ValidationStatus::Passed);
        assert_eq!(result.metadata["statement_count"], 2);
    }

    #[test]
    fn test_continuity_discontinuity() {
        let first = Statement {
            statement_period_from: date(1),
            statement_period_to: date(31),
            closing_balance: Some(dec!(13000)),
            ..Statement::default()
        };
        let second = Statement {
            statement_period_from: NaiveDate::from_ymd_opt(2024, 2, 1),
            statement_period_to: NaiveDate::from_ymd_opt(2024, 2, 29),
            opening_balance: Some(dec!(12500)),
            ..Statement::default()
        };

        let result = BalanceValidator::new().validate_continuity(&[first, second]);
        assert_eq!(result.error_count(), 1);
        let issue = result.errors().next().expect("one error");
        assert_eq!(issue.kind, IssueKind::CrossDocumentInconsistency);
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.context["statement_1_period"], "2024-01-01 to 2024-01-31");
        assert_eq!(issue.context["difference"], 500.0);
    }

    #[test]
    fn test_continuity_needs_two_statements() {
        let result = BalanceValidator::new().validate_continuity(&[sample_statement()]);
        assert_eq!(result.status, ValidationStatus::Warnings);
        let issue = result.warnings().next().expect("one warning");
        assert_eq!(issue.kind, IssueKind::InsufficientStatements);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = BalanceValidatorConfig {
            tolerance: dec!(-0.5),
        };
        assert!(matches!(
            BalanceValidator::with_config(config),
            Err(StatementError::InvalidTolerance(_))
        ));
    }
}
