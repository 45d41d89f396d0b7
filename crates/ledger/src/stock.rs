//! Stock ledger: per-(store, product) available-quantity counters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ProductId, StoreId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A stock row: how many units of a product a store can still promise.
///
/// Mutated only through ledger operations, never directly;
/// `available_quantity` never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub available_quantity: i64,
    pub last_updated: DateTime<Utc>,
}

impl Stock {
    /// Creates a stock row with the given starting quantity.
    pub fn new(store_id: StoreId, product_id: ProductId, available_quantity: i64) -> Self {
        Self {
            store_id,
            product_id,
            available_quantity,
            last_updated: Utc::now(),
        }
    }
}

/// Durable per-(store, product) stock counter.
///
/// Implementations must guard every mutation of a row with row-level
/// locking or equivalent isolation, so that two concurrent reservations
/// against the same row serialize and neither loses an update.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Looks up the stock row for a (store, product) pair.
    async fn get(&self, store_id: StoreId, product_id: ProductId) -> Result<Option<Stock>>;

    /// Lists every stock row held by a store.
    async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Stock>>;

    /// Creates the stock row, or adds `quantity` to it when it already
    /// exists. Returns the row as stored.
    async fn upsert(&self, store_id: StoreId, product_id: ProductId, quantity: i64)
    -> Result<Stock>;

    /// Sets the row's quantity to an absolute value. Rejects negative values
    /// and errors when the row does not exist.
    async fn set_quantity(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Stock>;

    /// Atomically checks `available_quantity >= quantity` and decrements in
    /// one step. Returns `false` without mutating on insufficiency; errors
    /// with `StockNotFound` when no row exists for the pair.
    async fn try_reserve(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool>;

    /// Unconditionally increments the product's stock row.
    ///
    /// Keyed by product alone: reservations do not record the store they
    /// were taken from, so compensation restores by product.
    async fn release(&self, product_id: ProductId, quantity: i64) -> Result<()>;
}
