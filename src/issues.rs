use std::collections::BTreeMap;

use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How bad a single finding is. `Info` is reserved for advisory findings;
/// the built-in validators emit only errors and warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Closed set of finding types the validators can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    BalanceMismatch,
    BalanceProgressionError,
    MissingBalance,
    CalculationError,
    CrossDocumentInconsistency,
    DateChronologyError,
    DateOutOfRange,
    MissingRequiredField,
    TransactionCountMismatch,
    MinorBalanceDifference,
    NoTransactions,
    InsufficientStatements,
    FutureDate,
    LongPeriod,
    PossibleDuplicate,
    LargeTransactionGap,
    StatementGap,
}

/// One validation finding. Serializes with the report field names (`type`,
/// `details`); the optional members stay off the wire when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, rename = "details")]
    pub context: BTreeMap<String, serde_json::Value>,
}

impl ValidationIssue {
    fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        ValidationIssue {
            kind,
            severity,
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
            recommendation: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        ValidationIssue::new(kind, Severity::Error, message)
    }

    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        ValidationIssue::new(kind, Severity::Warning, message)
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_expected(mut self, expected: Decimal) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn with_actual(mut self, actual: Decimal) -> Self {
        self.actual = Some(actual);
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// Attaches one context entry. Values that cannot be represented as JSON
    /// collapse to null rather than dropping the key.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.context.insert(key.into(), value);
        self
    }
}

/// Outcome bucket for a validation run: failed if any error was recorded,
/// warnings if any warning and no error, passed otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Passed,
    Warnings,
    Failed,
}

/// Findings of a single validator, in the order they were recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub validator_name: String,
    pub status: ValidationStatus,
    #[schemars(description = "True when no error-severity issue was recorded; warnings do not clear it.")]
    pub passed: bool,
    pub issues: Vec<ValidationIssue>,
    #[schemars(description = "Effective thresholds and run counters, for diagnostics.")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ValidationResult {
    pub fn new(validator_name: impl Into<String>) -> Self {
        ValidationResult {
            validator_name: validator_name.into(),
            status: ValidationStatus::Passed,
            passed: true,
            issues: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Records a finding and rederives `status`/`passed` from the full issue
    /// list, so insertion order can never leave the result understated.
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
        self.status = if self.error_count() > 0 {
            ValidationStatus::Failed
        } else if self.warning_count() > 0 {
            ValidationStatus::Warnings
        } else {
            ValidationStatus::Passed
        };
        self.passed = self.status != ValidationStatus::Failed;
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Serialize) {
        let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
        self.metadata.insert(key.into(), value);
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }
}

/// Union of per-validator results for one statement. Built once, never
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AggregatedValidationResult {
    pub statement_id: String,
    pub overall_status: ValidationStatus,
    #[schemars(description = "Validator names in the order they ran.")]
    pub validators_run: Vec<String>,
    pub results: Vec<ValidationResult>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl AggregatedValidationResult {
    pub fn from_results(statement_id: impl Into<String>, results: Vec<ValidationResult>) -> Self {
        let validators_run = results.iter().map(|r| r.validator_name.clone()).collect();
        let total_errors = results.iter().map(ValidationResult::error_count).sum();
        let total_warnings = results.iter().map(ValidationResult::warning_count).sum();
        let overall_status = if total_errors > 0 {
            ValidationStatus::Failed
        } else if total_warnings > 0 {
            ValidationStatus::Warnings
        } else {
            ValidationStatus::Passed
        };
        AggregatedValidationResult {
            statement_id: statement_id.into(),
            overall_status,
            validators_run,
            results,
            total_errors,
            total_warnings,
        }
    }

    pub fn passed(&self) -> bool {
        self.overall_status != ValidationStatus::Failed
    }

    pub fn result(&self, validator_name: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.validator_name == validator_name)
    }
}
