use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_CURRENCY: &str = "INR";

/// Whether a ledger entry moved money out of (debit) or into (credit) the
/// account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
}

/// One ledger entry extracted from a statement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transaction {
    #[schemars(description = "Transaction date, null when the source row had no parseable date.")]
    pub date: Option<NaiveDate>,
    pub description: String,
    #[schemars(description = "Amount withdrawn; 0 for credit entries.")]
    pub debit: Decimal,
    #[schemars(description = "Amount deposited; 0 for debit entries.")]
    pub credit: Decimal,
    #[schemars(
        description = "Running balance as stated by the source row, null when the sheet has no balance column."
    )]
    pub balance: Option<Decimal>,
    pub transaction_type: TransactionType,
    #[serde(rename = "reference_number")]
    #[schemars(description = "Cheque or reference number, when the sheet carries one.")]
    pub reference: Option<String>,
}

impl Transaction {
    /// Builds an entry, deriving `transaction_type` from the amounts: credit
    /// when `credit > 0`, debit otherwise.
    pub fn new(
        date: Option<NaiveDate>,
        description: impl Into<String>,
        debit: Decimal,
        credit: Decimal,
        balance: Option<Decimal>,
        reference: Option<String>,
    ) -> Self {
        let transaction_type = if credit > Decimal::ZERO {
            TransactionType::Credit
        } else {
            TransactionType::Debit
        };
        Transaction {
            date,
            description: description.into(),
            debit,
            credit,
            balance,
            transaction_type,
            reference,
        }
    }
}

/// One normalized bank account record for a period: metadata, balances,
/// aggregate totals and the ordered transaction sequence (insertion order is
/// source row order, never re-sorted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Statement {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder_name: Option<String>,
    pub branch_name: Option<String>,
    #[schemars(description = "Eleven-character branch code (IFSC-style).")]
    pub ifsc_code: Option<String>,
    pub currency: String,
    pub statement_period_from: Option<NaiveDate>,
    pub statement_period_to: Option<NaiveDate>,
    #[schemars(description = "Balance before the first transaction, back-solved from the first row.")]
    pub opening_balance: Option<Decimal>,
    #[schemars(description = "Balance stated on the last transaction row.")]
    pub closing_balance: Option<Decimal>,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    #[schemars(
        description = "Declared entry count; whether it matches the sequence length is a validation concern."
    )]
    pub number_of_transactions: usize,
    pub transactions: Vec<Transaction>,
}

impl Default for Statement {
    fn default() -> Self {
        Statement {
            bank_name: None,
            account_number: None,
            account_holder_name: None,
            branch_name: None,
            ifsc_code: None,
            currency: DEFAULT_CURRENCY.to_string(),
            statement_period_from: None,
            statement_period_to: None,
            opening_balance: None,
            closing_balance: None,
            total_credits: Decimal::ZERO,
            total_debits: Decimal::ZERO,
            number_of_transactions: 0,
            transactions: Vec::new(),
        }
    }
}

impl Statement {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Statement> {
        Ok(serde_json::from_str(json)?)
    }

    /// Human-readable period span for log lines and issue context.
    pub(crate) fn period_label(&self) -> String {
        let fmt = |date: Option<NaiveDate>| {
            date.map_or_else(|| "unknown".to_string(), |d| d.format("%Y-%m-%d").to_string())
        };
        format!(
            "{} to {}",
            fmt(self.statement_period_from),
            fmt(self.statement_period_to)
        )
    }
}

/// JSON Schema for the statement record, for collaborators that validate
/// payloads before storing or querying them.
pub fn statement_schema() -> Result<serde_json::Value> {
    Ok(serde_json::to_value(schemars::schema_for!(Statement))?)
}
