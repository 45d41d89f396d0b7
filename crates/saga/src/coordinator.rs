//! Saga coordinator: drives the per-item reservation loop.

use common::OrderId;
use domain::{OrderCanceled, OrderCreated, OrderItem, StoreUpdated};
use egress::{CancellationPublisher, EventBus, StoreUpdatedPublisher};
use ledger::{LedgerError, Reservation, ReservationLedger, StockLedger};

use crate::compensator::Compensator;
use crate::outcome::{ItemOutcome, SagaOutcome};

/// Orchestrates inventory reservation for one order-creation event.
///
/// Items are processed strictly in the order they appear in the payload,
/// never in parallel: each item's outcome decides whether later items are
/// attempted at all, and the compensation set is exactly "everything
/// reserved so far", which is only well-defined under sequential execution.
pub struct ReservationCoordinator<SL, RL, B>
where
    SL: StockLedger,
    RL: ReservationLedger,
    B: EventBus,
{
    stock: SL,
    reservations: RL,
    compensator: Compensator<SL, RL>,
    store_updated: StoreUpdatedPublisher<B>,
    cancellations: CancellationPublisher<B>,
    merchant_email: String,
}

impl<SL, RL, B> ReservationCoordinator<SL, RL, B>
where
    SL: StockLedger + Clone,
    RL: ReservationLedger + Clone,
    B: EventBus + Clone,
{
    /// Creates a new coordinator over the ledgers and the outbound bus.
    pub fn new(stock: SL, reservations: RL, bus: B, merchant_email: impl Into<String>) -> Self {
        let compensator = Compensator::new(stock.clone(), reservations.clone());
        Self {
            stock,
            reservations,
            compensator,
            store_updated: StoreUpdatedPublisher::new(bus.clone()),
            cancellations: CancellationPublisher::new(bus),
            merchant_email: merchant_email.into(),
        }
    }

    /// Processes one order-creation event to a terminal outcome.
    ///
    /// Always completes: a shortfall or an infrastructure failure inside the
    /// loop compensates everything reserved so far and publishes one
    /// cancellation, instead of surfacing to the delivery layer where it
    /// would trigger a redelivery loop. Failures are visible through the
    /// `saga_*` counters and logs.
    ///
    /// Redelivery of an already-processed event re-reserves: there is no
    /// deduplication key on inbound order events yet.
    #[tracing::instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn process(&self, order: &OrderCreated) -> SagaOutcome {
        metrics::counter!("saga_orders_processed_total").increment(1);
        let saga_start = std::time::Instant::now();

        let mut reserved: Vec<Reservation> = Vec::new();

        for item in &order.order_items {
            match self.reserve_item(order.order_id, item).await {
                Ok(ItemOutcome::Reserved(reservation)) => {
                    reserved.push(reservation);
                }
                Ok(ItemOutcome::Shortfall { product_id }) => {
                    metrics::counter!("saga_shortfalls_total").increment(1);
                    tracing::warn!(
                        %product_id,
                        requested = item.quantity,
                        "insufficient stock, rolling back order"
                    );

                    let canceled = OrderCanceled::insufficient_stock(order, product_id);
                    let reason = canceled.reason.clone();
                    self.abort(&reserved, &canceled).await;

                    metrics::histogram!("saga_duration_seconds")
                        .record(saga_start.elapsed().as_secs_f64());
                    // Later items were never touched; stop here.
                    return SagaOutcome::Compensated { reason };
                }
                Err(e) => {
                    metrics::counter!("saga_infra_failures_total").increment(1);
                    tracing::error!(
                        product_id = %item.product_id,
                        error = %e,
                        "ledger failure mid-saga, rolling back order"
                    );

                    let canceled = OrderCanceled::new(
                        order.order_id,
                        format!("Reservation failed for product {}", item.product_id),
                        order.customer_email.clone(),
                    );
                    let reason = canceled.reason.clone();
                    self.abort(&reserved, &canceled).await;

                    metrics::histogram!("saga_duration_seconds")
                        .record(saga_start.elapsed().as_secs_f64());
                    return SagaOutcome::Compensated { reason };
                }
            }
        }

        let event = StoreUpdated::for_reserved_order(order, self.merchant_email.as_str());
        if let Err(e) = self.store_updated.publish(&event).await {
            // The reservations themselves are durable; the downstream event
            // is lost and must be reconciled from the counters.
            metrics::counter!("saga_publish_failures_total").increment(1);
            tracing::error!(error = %e, "failed to publish store updated event");
        }

        metrics::histogram!("saga_duration_seconds").record(saga_start.elapsed().as_secs_f64());
        metrics::counter!("saga_orders_reserved_total").increment(1);
        tracing::info!(items_reserved = reserved.len(), "order fully reserved");

        SagaOutcome::Completed {
            items_reserved: reserved.len(),
        }
    }

    /// Attempts one item: atomic check-and-decrement, then a durable hold.
    async fn reserve_item(
        &self,
        order_id: OrderId,
        item: &OrderItem,
    ) -> Result<ItemOutcome, LedgerError> {
        let quantity = i64::from(item.quantity);

        let decremented = match self
            .stock
            .try_reserve(item.store_id, item.product_id, quantity)
            .await
        {
            Ok(decremented) => decremented,
            // A store that carries no stock row for the product cannot
            // satisfy it either; same outcome as too little stock.
            Err(e) if e.is_not_found() => {
                return Ok(ItemOutcome::Shortfall {
                    product_id: item.product_id,
                });
            }
            Err(e) => return Err(e),
        };

        if !decremented {
            return Ok(ItemOutcome::Shortfall {
                product_id: item.product_id,
            });
        }

        let reservation = Reservation::new(order_id, item.product_id, quantity);
        if let Err(e) = self.reservations.append(reservation.clone()).await {
            // The decrement landed but the hold did not; undo the decrement
            // before reporting the failure so this item never needs
            // compensating.
            if let Err(release_err) = self.stock.release(item.product_id, quantity).await {
                tracing::error!(
                    product_id = %item.product_id,
                    error = %release_err,
                    "failed to restore stock after reservation write failure"
                );
            }
            return Err(e);
        }

        metrics::counter!("saga_items_reserved_total").increment(1);
        Ok(ItemOutcome::Reserved(reservation))
    }

    /// Compensates everything reserved so far and publishes the cancellation.
    async fn abort(&self, reserved: &[Reservation], canceled: &OrderCanceled) {
        if let Err(e) = self.compensator.compensate(canceled.order_id, reserved).await {
            metrics::counter!("saga_compensation_failures_total").increment(1);
            tracing::error!(
                order_id = %canceled.order_id,
                error = %e,
                "compensation failed, ledger requires reconciliation"
            );
        }

        if let Err(e) = self.cancellations.publish(canceled).await {
            metrics::counter!("saga_publish_failures_total").increment(1);
            tracing::error!(
                order_id = %canceled.order_id,
                error = %e,
                "failed to publish order canceled event"
            );
        }

        metrics::counter!("saga_orders_compensated_total").increment(1);
    }
}
