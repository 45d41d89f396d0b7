//! Listener for externally-originated order cancellations.

use domain::OrderCanceled;
use egress::{CancellationPublisher, EventBus};
use ledger::{ReservationLedger, StockLedger};

use crate::compensator::Compensator;
use crate::error::{Result, SagaError};

/// Handles cancellations that arrive from outside the saga, e.g. the
/// payment service failing an order the store already reserved.
pub struct CancellationListener<SL, RL, B>
where
    SL: StockLedger,
    RL: ReservationLedger,
    B: EventBus,
{
    reservations: RL,
    compensator: Compensator<SL, RL>,
    acks: CancellationPublisher<B>,
}

impl<SL, RL, B> CancellationListener<SL, RL, B>
where
    SL: StockLedger + Clone,
    RL: ReservationLedger + Clone,
    B: EventBus,
{
    /// Creates a new listener over the ledgers and the outbound bus.
    pub fn new(stock: SL, reservations: RL, bus: B) -> Self {
        let compensator = Compensator::new(stock, reservations.clone());
        Self {
            reservations,
            compensator,
            acks: CancellationPublisher::new(bus),
        }
    }

    /// Compensates every reservation the order has on record, then
    /// acknowledges the cancellation downstream.
    ///
    /// An order with no reservations at all is reported as
    /// [`SagaError::ReservationsNotFound`]: under at-least-once delivery the
    /// cancellation can outrun the reservation writes, and surfacing the
    /// error lets the transport redeliver once they have landed.
    ///
    /// Returns how many reservations this call reversed; zero means the
    /// order was already fully compensated (redelivery is a no-op).
    #[tracing::instrument(skip(self, event), fields(order_id = %event.order_id))]
    pub async fn on_external_cancel(&self, event: &OrderCanceled) -> Result<usize> {
        metrics::counter!("cancellation_events_total").increment(1);
        tracing::info!(reason = %event.reason, "consumed order canceled event");

        let reservations = self.reservations.find_by_order(event.order_id).await?;
        if reservations.is_empty() {
            metrics::counter!("cancellation_not_found_total").increment(1);
            return Err(SagaError::ReservationsNotFound(event.order_id));
        }

        let released = self
            .compensator
            .compensate(event.order_id, &reservations)
            .await?;

        self.acks.publish(event).await?;

        tracing::info!(released, "external cancellation compensated");
        Ok(released)
    }
}
