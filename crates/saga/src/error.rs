//! Saga error types.

use common::OrderId;
use domain::ValidationError;
use egress::EgressError;
use ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during saga operations.
///
/// Business shortfalls are not errors: the coordinator reports them through
/// [`crate::SagaOutcome`] and never lets them surface to the delivery layer.
#[derive(Debug, Error)]
pub enum SagaError {
    /// No reservations exist for the order a cancellation referenced.
    #[error("No reservations found for order {0}")]
    ReservationsNotFound(OrderId),

    /// The inbound payload failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Ledger error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Outbound publish error.
    #[error("Egress error: {0}")]
    Egress(#[from] EgressError),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
