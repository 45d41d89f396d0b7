//! Shared identifier types used across the store inventory service.

pub mod types;

pub use types::{OrderId, ProductId, StoreId, UserId};
