//! Compensation: reversing previously applied reservations.

use common::OrderId;
use ledger::{Reservation, ReservationLedger, StockLedger};

use crate::error::Result;

/// Reverses still-`Reserved` reservations against the stock ledger.
///
/// Called by the coordinator with its in-invocation reservation list, and by
/// the cancellation listener with persisted lookups. Idempotent: an entry
/// already `Canceled` is skipped, never double-restored.
pub struct Compensator<SL, RL>
where
    SL: StockLedger,
    RL: ReservationLedger,
{
    stock: SL,
    reservations: RL,
}

impl<SL, RL> Compensator<SL, RL>
where
    SL: StockLedger,
    RL: ReservationLedger,
{
    /// Creates a new compensator over the two ledgers.
    pub fn new(stock: SL, reservations: RL) -> Self {
        Self {
            stock,
            reservations,
        }
    }

    /// Cancels every still-`Reserved` entry in `reservations` and restores
    /// its stock. Returns how many entries this call actually reversed.
    ///
    /// The status flip happens before the stock restore: if two compensation
    /// runs race, only the one that wins the conditional flip performs the
    /// restore.
    #[tracing::instrument(skip(self, reservations), fields(%order_id))]
    pub async fn compensate(
        &self,
        order_id: OrderId,
        reservations: &[Reservation],
    ) -> Result<usize> {
        let mut released = 0usize;

        for reservation in reservations {
            if !reservation.status.can_cancel() {
                continue;
            }

            if !self.reservations.mark_canceled(reservation.id).await? {
                // Lost the flip to a concurrent compensation; nothing to restore.
                continue;
            }

            self.stock
                .release(reservation.product_id, reservation.reserved_quantity)
                .await?;

            tracing::debug!(
                product_id = %reservation.product_id,
                quantity = reservation.reserved_quantity,
                "reservation compensated"
            );
            released += 1;
        }

        if released > 0 {
            metrics::counter!("saga_reservations_compensated_total").increment(released as u64);
        }

        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ProductId, StoreId};
    use ledger::{InMemoryLedger, ReservationStatus};

    async fn seeded_ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 10).await;
        ledger.seed_stock(StoreId::new(1), ProductId::new(2), 10).await;
        ledger
    }

    #[tokio::test]
    async fn test_compensate_restores_stock_and_flips_status() {
        let ledger = seeded_ledger().await;
        ledger
            .try_reserve(StoreId::new(1), ProductId::new(1), 4)
            .await
            .unwrap();
        let reservation = Reservation::new(OrderId::new(1), ProductId::new(1), 4);
        ledger.append(reservation.clone()).await.unwrap();

        let compensator = Compensator::new(ledger.clone(), ledger.clone());
        let released = compensator
            .compensate(OrderId::new(1), &[reservation])
            .await
            .unwrap();

        assert_eq!(released, 1);
        assert_eq!(
            ledger.stock_quantity(StoreId::new(1), ProductId::new(1)).await,
            Some(10)
        );
        let stored = ledger.find_by_order(OrderId::new(1)).await.unwrap();
        assert_eq!(stored[0].status, ReservationStatus::Canceled);
    }

    #[tokio::test]
    async fn test_compensate_twice_is_idempotent() {
        let ledger = seeded_ledger().await;
        ledger
            .try_reserve(StoreId::new(1), ProductId::new(1), 4)
            .await
            .unwrap();
        let reservation = Reservation::new(OrderId::new(1), ProductId::new(1), 4);
        ledger.append(reservation.clone()).await.unwrap();

        let compensator = Compensator::new(ledger.clone(), ledger.clone());
        compensator
            .compensate(OrderId::new(1), &[reservation])
            .await
            .unwrap();

        // Second invocation against the persisted (now Canceled) records
        let persisted = ledger.find_by_order(OrderId::new(1)).await.unwrap();
        let released = compensator
            .compensate(OrderId::new(1), &persisted)
            .await
            .unwrap();

        assert_eq!(released, 0);
        assert_eq!(
            ledger.stock_quantity(StoreId::new(1), ProductId::new(1)).await,
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_compensate_skips_already_canceled_entries() {
        let ledger = seeded_ledger().await;
        let mut reservation = Reservation::new(OrderId::new(1), ProductId::new(2), 3);
        reservation.status = ReservationStatus::Canceled;
        ledger.append(reservation.clone()).await.unwrap();

        let compensator = Compensator::new(ledger.clone(), ledger.clone());
        let released = compensator
            .compensate(OrderId::new(1), &[reservation])
            .await
            .unwrap();

        assert_eq!(released, 0);
        assert_eq!(
            ledger.stock_quantity(StoreId::new(1), ProductId::new(2)).await,
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_compensate_empty_list_is_noop() {
        let ledger = seeded_ledger().await;
        let compensator = Compensator::new(ledger.clone(), ledger.clone());
        let released = compensator.compensate(OrderId::new(7), &[]).await.unwrap();
        assert_eq!(released, 0);
    }
}
