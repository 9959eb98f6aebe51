//! Error types for the split ledger.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while validating input or persisting state.
///
/// Every variant is fatal to the current invocation: commands abort before
/// any mutation, so the store is never left half-updated.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A ratio file row did not have exactly two fields
    #[error("{user}: ratio not found")]
    MalformedRatioRow { user: String },

    /// A token that should be a decimal number failed to parse
    #[error("invalid number: {token}")]
    InvalidNumber { token: String },

    /// The ratio table does not sum to exactly 1
    #[error("sum of ratios is {sum}, expected exactly 1")]
    RatioSumMismatch { sum: Decimal },

    /// A user token is not present in the ratio table
    #[error("{user}: user not found")]
    UnknownUser { user: String },

    /// Contributor amounts do not sum to the declared expense amount
    #[error("contributions sum to {contributed}, declared amount is {declared}")]
    AmountMismatch {
        declared: Decimal,
        contributed: Decimal,
    },

    /// The command line could not be interpreted
    #[error("{message}")]
    MalformedCommand { message: String },

    /// Failed to open or read the ratio file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ratio file parsing error
    #[error("ratio file error: {0}")]
    Csv(#[from] csv::Error),

    /// Key-value store error
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Serialization error for persisted records
    #[error("record encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
