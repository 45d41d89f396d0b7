//! Domain layer for the store inventory service.
//!
//! This crate provides the event payloads exchanged with the order and
//! payment services, the value objects they carry, and validation of inbound
//! payloads:
//! - `OrderCreated`: inbound order-creation event that triggers reservation
//! - `OrderCanceled`: inbound external cancellation, also the outbound
//!   cancellation/acknowledgement payload
//! - `StoreUpdated`: outbound event emitted after a fully reserved order

pub mod error;
pub mod events;
pub mod money;

pub use error::ValidationError;
pub use events::{
    AddressDetails, OrderCanceled, OrderCreated, OrderItem, PaymentDetails, PaymentMethod,
    StoreUpdated,
};
pub use money::Money;
