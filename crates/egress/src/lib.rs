//! Event egress for the store inventory service.
//!
//! Outbound events leave through an [`EventBus`] seam that supports an
//! explicit partition override. `StoreUpdated` events are routed to a
//! partition derived deterministically from the order id, so that all events
//! for one order land on the same ordered partition; cancellation
//! acknowledgements go out with the broker's default distribution.

pub mod bus;
pub mod error;
pub mod partition;
pub mod publisher;
pub mod topics;

pub use bus::{EventBus, InMemoryEventBus, OutboundMessage};
pub use error::{EgressError, Result};
pub use partition::Partitioner;
pub use publisher::{CancellationPublisher, StoreUpdatedPublisher};
