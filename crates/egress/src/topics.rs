//! Topic map for the streams this service touches.

/// Inbound: order-creation events from the order service.
pub const ORDER_EVENTS_TOPIC: &str = "order-events";

/// Inbound: externally-originated cancellations (e.g. failed payments).
pub const PAYMENT_CANCELED_TOPIC: &str = "payment-canceled-events";

/// Outbound: store-state propagation after a fully reserved order.
pub const STORE_UPDATED_TOPIC: &str = "store-updated-events";

/// Outbound: cancellations and cancellation acknowledgements.
pub const STORE_EVENTS_TOPIC: &str = "store-events";

/// Outbound: inbound payloads that failed validation and will never retry.
pub const DEAD_LETTER_TOPIC: &str = "store-dead-letter-events";

/// Partition count of the store-updated stream.
pub const STORE_UPDATED_PARTITIONS: u32 = 2;
