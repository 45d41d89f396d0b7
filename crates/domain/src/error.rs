//! Validation errors for inbound event payloads.

use common::ProductId;
use thiserror::Error;

/// Errors raised when an inbound event payload fails validation.
///
/// Validation failures are rejected without retry: the payload will never
/// become valid on redelivery, so the delivery layer routes it to the
/// dead-letter topic instead.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The payload could not be deserialized at all.
    #[error("Malformed event payload: {0}")]
    Malformed(String),

    /// An order-creation event arrived with no items.
    #[error("Order {order_id} has no items")]
    NoItems { order_id: i64 },

    /// An order item requested a zero quantity.
    #[error("Order item for product {product_id} has zero quantity")]
    ZeroQuantity { product_id: ProductId },
}
