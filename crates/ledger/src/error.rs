use common::ProductId;
use thiserror::Error;

/// Errors that can occur when interacting with the ledgers.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No stock row exists for the referenced product.
    #[error("Stock not found for product {0}")]
    StockNotFound(ProductId),

    /// A quantity that must be non-negative was negative.
    #[error("Stock quantity cannot be negative: {0}")]
    NegativeQuantity(i64),

    /// A stored row could not be decoded into a ledger record.
    #[error("Corrupt ledger row: {0}")]
    Decode(String),

    /// The ledger backend is unreachable or refused the operation.
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl LedgerError {
    /// Returns true when the error is a missing-row condition rather than an
    /// infrastructure fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::StockNotFound(_))
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
