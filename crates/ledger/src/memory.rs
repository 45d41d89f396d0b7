use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, StoreId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{LedgerError, Result};
use crate::reservation::{Reservation, ReservationLedger, ReservationStatus};
use crate::stock::{Stock, StockLedger};

#[derive(Debug, Default)]
struct LedgerState {
    stocks: HashMap<(StoreId, ProductId), Stock>,
    reservations: Vec<Reservation>,
    fail_on_reserve: bool,
    fail_on_append: bool,
}

/// In-memory ledger implementation for tests and local runs.
///
/// Holds both the stock and reservation ledgers behind one lock, so a
/// check-and-decrement is atomic exactly like the row-locked PostgreSQL
/// implementation.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    /// Creates a new empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a stock row, replacing any existing quantity.
    pub async fn seed_stock(&self, store_id: StoreId, product_id: ProductId, quantity: i64) {
        let mut state = self.state.write().await;
        state
            .stocks
            .insert((store_id, product_id), Stock::new(store_id, product_id, quantity));
    }

    /// Returns the current quantity for a (store, product) pair.
    pub async fn stock_quantity(&self, store_id: StoreId, product_id: ProductId) -> Option<i64> {
        let state = self.state.read().await;
        state
            .stocks
            .get(&(store_id, product_id))
            .map(|s| s.available_quantity)
    }

    /// Returns every reservation recorded so far.
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.state.read().await.reservations.clone()
    }

    /// Returns the total number of reservations recorded.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    /// Configures `try_reserve` to fail as if the backend were unreachable.
    pub async fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().await.fail_on_reserve = fail;
    }

    /// Configures reservation appends to fail as if the backend were
    /// unreachable.
    pub async fn set_fail_on_append(&self, fail: bool) {
        self.state.write().await.fail_on_append = fail;
    }
}

#[async_trait]
impl StockLedger for InMemoryLedger {
    async fn get(&self, store_id: StoreId, product_id: ProductId) -> Result<Option<Stock>> {
        let state = self.state.read().await;
        Ok(state.stocks.get(&(store_id, product_id)).cloned())
    }

    async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Stock>> {
        let state = self.state.read().await;
        let mut stocks: Vec<_> = state
            .stocks
            .values()
            .filter(|s| s.store_id == store_id)
            .cloned()
            .collect();
        stocks.sort_by_key(|s| s.product_id);
        Ok(stocks)
    }

    async fn upsert(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Stock> {
        if quantity < 0 {
            return Err(LedgerError::NegativeQuantity(quantity));
        }
        let mut state = self.state.write().await;
        let stock = state
            .stocks
            .entry((store_id, product_id))
            .and_modify(|s| {
                s.available_quantity += quantity;
                s.last_updated = Utc::now();
            })
            .or_insert_with(|| Stock::new(store_id, product_id, quantity));
        Ok(stock.clone())
    }

    async fn set_quantity(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Stock> {
        if quantity < 0 {
            return Err(LedgerError::NegativeQuantity(quantity));
        }
        let mut state = self.state.write().await;
        let stock = state
            .stocks
            .get_mut(&(store_id, product_id))
            .ok_or(LedgerError::StockNotFound(product_id))?;
        stock.available_quantity = quantity;
        stock.last_updated = Utc::now();
        Ok(stock.clone())
    }

    async fn try_reserve(
        &self,
        store_id: StoreId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<bool> {
        let mut state = self.state.write().await;

        if state.fail_on_reserve {
            return Err(LedgerError::Unavailable("stock ledger down".to_string()));
        }

        let stock = state
            .stocks
            .get_mut(&(store_id, product_id))
            .ok_or(LedgerError::StockNotFound(product_id))?;

        if stock.available_quantity < quantity {
            return Ok(false);
        }

        stock.available_quantity -= quantity;
        stock.last_updated = Utc::now();
        Ok(true)
    }

    async fn release(&self, product_id: ProductId, quantity: i64) -> Result<()> {
        let mut state = self.state.write().await;
        let stock = state
            .stocks
            .values_mut()
            .find(|s| s.product_id == product_id)
            .ok_or(LedgerError::StockNotFound(product_id))?;
        stock.available_quantity += quantity;
        stock.last_updated = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ReservationLedger for InMemoryLedger {
    async fn append(&self, reservation: Reservation) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_append {
            return Err(LedgerError::Unavailable(
                "reservation ledger down".to_string(),
            ));
        }
        state.reservations.push(reservation);
        Ok(())
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Reservation>> {
        let state = self.state.read().await;
        Ok(state
            .reservations
            .iter()
            .filter(|r| r.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn mark_canceled(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.reservations.iter_mut().find(|r| r.id == id) {
            Some(r) if r.status.can_cancel() => {
                r.status = ReservationStatus::Canceled;
                r.last_updated = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_reserve_decrements() {
        let ledger = InMemoryLedger::new();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 10).await;

        let reserved = ledger
            .try_reserve(StoreId::new(1), ProductId::new(1), 4)
            .await
            .unwrap();
        assert!(reserved);
        assert_eq!(
            ledger.stock_quantity(StoreId::new(1), ProductId::new(1)).await,
            Some(6)
        );
    }

    #[tokio::test]
    async fn test_try_reserve_insufficient_does_not_mutate() {
        let ledger = InMemoryLedger::new();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 2).await;

        let reserved = ledger
            .try_reserve(StoreId::new(1), ProductId::new(1), 3)
            .await
            .unwrap();
        assert!(!reserved);
        assert_eq!(
            ledger.stock_quantity(StoreId::new(1), ProductId::new(1)).await,
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_try_reserve_missing_row_is_not_found() {
        let ledger = InMemoryLedger::new();
        let err = ledger
            .try_reserve(StoreId::new(1), ProductId::new(99), 1)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_concurrent_reserves_never_oversell() {
        let ledger = InMemoryLedger::new();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 5).await;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .try_reserve(StoreId::new(1), ProductId::new(1), 1)
                    .await
                    .unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 5);
        assert_eq!(
            ledger.stock_quantity(StoreId::new(1), ProductId::new(1)).await,
            Some(0)
        );
    }

    #[tokio::test]
    async fn test_release_restores_by_product() {
        let ledger = InMemoryLedger::new();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 10).await;

        ledger
            .try_reserve(StoreId::new(1), ProductId::new(1), 4)
            .await
            .unwrap();
        ledger.release(ProductId::new(1), 4).await.unwrap();

        assert_eq!(
            ledger.stock_quantity(StoreId::new(1), ProductId::new(1)).await,
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_mark_canceled_flips_once() {
        let ledger = InMemoryLedger::new();
        let reservation = Reservation::new(OrderId::new(1), ProductId::new(1), 2);
        let id = reservation.id;
        ledger.append(reservation).await.unwrap();

        assert!(ledger.mark_canceled(id).await.unwrap());
        assert!(!ledger.mark_canceled(id).await.unwrap());

        let reservations = ledger.find_by_order(OrderId::new(1)).await.unwrap();
        assert_eq!(reservations.len(), 1);
        assert_eq!(reservations[0].status, ReservationStatus::Canceled);
    }

    #[tokio::test]
    async fn test_mark_canceled_unknown_id_is_false() {
        let ledger = InMemoryLedger::new();
        assert!(!ledger.mark_canceled(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_adds_to_existing_row() {
        let ledger = InMemoryLedger::new();
        ledger
            .upsert(StoreId::new(1), ProductId::new(1), 5)
            .await
            .unwrap();
        let stock = ledger
            .upsert(StoreId::new(1), ProductId::new(1), 3)
            .await
            .unwrap();
        assert_eq!(stock.available_quantity, 8);
    }

    #[tokio::test]
    async fn test_set_quantity_rejects_negative() {
        let ledger = InMemoryLedger::new();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 5).await;

        let err = ledger
            .set_quantity(StoreId::new(1), ProductId::new(1), -1)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NegativeQuantity(-1)));
    }

    #[tokio::test]
    async fn test_list_by_store_filters() {
        let ledger = InMemoryLedger::new();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 5).await;
        ledger.seed_stock(StoreId::new(1), ProductId::new(2), 7).await;
        ledger.seed_stock(StoreId::new(2), ProductId::new(3), 9).await;

        let stocks = ledger.list_by_store(StoreId::new(1)).await.unwrap();
        assert_eq!(stocks.len(), 2);
        assert!(stocks.iter().all(|s| s.store_id == StoreId::new(1)));
    }
}
