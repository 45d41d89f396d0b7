//! Explicit outcome values for saga steps.
//!
//! A shortfall is a normal business outcome, not a fault, so the per-item
//! result is a value the coordinator loop inspects rather than an error it
//! unwinds on.

use common::ProductId;
use ledger::Reservation;

/// The outcome of attempting to reserve one order item.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    /// Stock was decremented and a durable hold recorded.
    Reserved(Reservation),

    /// The store cannot satisfy the requested quantity (including the case
    /// where it carries no stock row for the product at all).
    Shortfall {
        /// The product that could not be reserved.
        product_id: ProductId,
    },
}

impl ItemOutcome {
    /// Returns true if the item was reserved.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ItemOutcome::Reserved(_))
    }
}

/// The terminal outcome of processing one order-creation event.
///
/// Processing always completes with one of these; neither variant is an
/// error as far as the message-delivery layer is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
    /// Every item reserved; one store-updated event went out.
    Completed {
        /// How many items were reserved.
        items_reserved: usize,
    },

    /// A shortfall or infrastructure failure rolled the order back; one
    /// cancellation event went out.
    Compensated {
        /// Human-readable reason carried on the cancellation event.
        reason: String,
    },
}

impl SagaOutcome {
    /// Returns true if the order was fully reserved.
    pub fn is_completed(&self) -> bool {
        matches!(self, SagaOutcome::Completed { .. })
    }
}
