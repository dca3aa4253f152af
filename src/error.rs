use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Input grid is empty after removing blank rows and columns")]
    EmptyGrid,

    #[error("Invalid header scan window {0}: must be at least 1 row")]
    InvalidScanWindow(usize),

    #[error("Invalid tolerance {0}: must not be negative")]
    InvalidTolerance(rust_decimal::Decimal),

    #[error("Invalid {name} of {days} days: must be at least 1")]
    InvalidDayThreshold { name: &'static str, days: i64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StatementError>;
