//! Inbound delivery layer: payload validation and dead-letter routing.

use domain::{OrderCanceled, OrderCreated, ValidationError};
use egress::{EventBus, OutboundMessage, topics};
use ledger::{ReservationLedger, StockLedger};
use serde_json::Value;

use crate::coordinator::ReservationCoordinator;
use crate::error::Result;
use crate::listener::CancellationListener;
use crate::outcome::SagaOutcome;

/// Entry point for raw inbound payloads from the transport.
///
/// Parses and validates each payload before dispatching it. A malformed
/// payload will never become valid on redelivery, so it is logged, counted,
/// and routed to the dead-letter topic instead of retried.
pub struct OrderEventConsumer<SL, RL, B>
where
    SL: StockLedger,
    RL: ReservationLedger,
    B: EventBus,
{
    coordinator: ReservationCoordinator<SL, RL, B>,
    listener: CancellationListener<SL, RL, B>,
    bus: B,
}

impl<SL, RL, B> OrderEventConsumer<SL, RL, B>
where
    SL: StockLedger + Clone,
    RL: ReservationLedger + Clone,
    B: EventBus + Clone,
{
    /// Creates a consumer wiring both saga entry points to one bus.
    pub fn new(stock: SL, reservations: RL, bus: B, merchant_email: impl Into<String>) -> Self {
        Self {
            coordinator: ReservationCoordinator::new(
                stock.clone(),
                reservations.clone(),
                bus.clone(),
                merchant_email,
            ),
            listener: CancellationListener::new(stock, reservations, bus.clone()),
            bus,
        }
    }

    /// Handles a raw payload from the order-events stream.
    pub async fn handle_order_created(&self, payload: Value) -> Result<SagaOutcome> {
        let order: OrderCreated = match serde_json::from_value(payload.clone()) {
            Ok(order) => order,
            Err(e) => {
                let error = ValidationError::Malformed(e.to_string());
                self.dead_letter(payload, &error).await;
                return Err(error.into());
            }
        };

        if let Err(error) = order.validate() {
            self.dead_letter(payload, &error).await;
            return Err(error.into());
        }

        tracing::info!(order_id = %order.order_id, "consumed order created event");
        Ok(self.coordinator.process(&order).await)
    }

    /// Handles a raw payload from the payment-canceled stream.
    ///
    /// Dispatch errors (including the reservations-not-found race) propagate
    /// so the transport can retry delivery.
    pub async fn handle_order_canceled(&self, payload: Value) -> Result<usize> {
        let event: OrderCanceled = match serde_json::from_value(payload.clone()) {
            Ok(event) => event,
            Err(e) => {
                let error = ValidationError::Malformed(e.to_string());
                self.dead_letter(payload, &error).await;
                return Err(error.into());
            }
        };

        self.listener.on_external_cancel(&event).await
    }

    async fn dead_letter(&self, payload: Value, error: &ValidationError) {
        metrics::counter!("dead_letter_events_total").increment(1);
        tracing::warn!(error = %error, "routing invalid event to dead letter topic");

        if let Err(e) = self
            .bus
            .publish(OutboundMessage::new(topics::DEAD_LETTER_TOPIC, payload))
            .await
        {
            tracing::error!(error = %e, "failed to publish to dead letter topic");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SagaError;
    use common::{ProductId, StoreId};
    use egress::InMemoryEventBus;
    use ledger::InMemoryLedger;
    use serde_json::json;

    fn setup() -> (
        OrderEventConsumer<InMemoryLedger, InMemoryLedger, InMemoryEventBus>,
        InMemoryLedger,
        InMemoryEventBus,
    ) {
        let ledger = InMemoryLedger::new();
        let bus = InMemoryEventBus::new();
        let consumer = OrderEventConsumer::new(
            ledger.clone(),
            ledger.clone(),
            bus.clone(),
            "merchant@store.example",
        );
        (consumer, ledger, bus)
    }

    fn valid_order_payload() -> Value {
        json!({
            "orderId": 1001,
            "userId": 7,
            "sagaEventType": "ORDER_CREATED",
            "status": "CREATED",
            "customerEmail": "customer@example.com",
            "customerName": "Jane Doe",
            "customerContact": "+201000000000",
            "addressDetails": {
                "governorate": "Cairo",
                "city": "Nasr City",
                "address": "12 Example St"
            },
            "paymentAmount": 12500,
            "orderItems": [
                {"storeId": 1, "productId": 1, "quantity": 2, "price": 500}
            ],
            "paymentMethod": {
                "details": {"number": "4111111111111111", "cvv": "123", "expiry": "12/27"}
            }
        })
    }

    #[tokio::test]
    async fn test_valid_order_is_dispatched() {
        let (consumer, ledger, bus) = setup();
        ledger.seed_stock(StoreId::new(1), ProductId::new(1), 10).await;

        let outcome = consumer
            .handle_order_created(valid_order_payload())
            .await
            .unwrap();

        assert!(outcome.is_completed());
        assert!(bus.published_to(topics::DEAD_LETTER_TOPIC).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_order_goes_to_dead_letter() {
        let (consumer, ledger, bus) = setup();

        let payload = json!({"orderId": "not-a-number"});
        let err = consumer.handle_order_created(payload).await.unwrap_err();

        assert!(matches!(
            err,
            SagaError::Validation(ValidationError::Malformed(_))
        ));
        assert_eq!(bus.published_to(topics::DEAD_LETTER_TOPIC).await.len(), 1);
        assert_eq!(ledger.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_order_goes_to_dead_letter() {
        let (consumer, _ledger, bus) = setup();

        let mut payload = valid_order_payload();
        payload["orderItems"] = json!([]);
        let err = consumer.handle_order_created(payload).await.unwrap_err();

        assert!(matches!(
            err,
            SagaError::Validation(ValidationError::NoItems { order_id: 1001 })
        ));
        assert_eq!(bus.published_to(topics::DEAD_LETTER_TOPIC).await.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_cancellation_goes_to_dead_letter() {
        let (consumer, _ledger, bus) = setup();

        let err = consumer
            .handle_order_canceled(json!({"reason": 42}))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SagaError::Validation(ValidationError::Malformed(_))
        ));
        assert_eq!(bus.published_to(topics::DEAD_LETTER_TOPIC).await.len(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_not_found_propagates_for_retry() {
        let (consumer, _ledger, bus) = setup();

        let payload = json!({
            "orderId": 42,
            "reason": "payment failed",
            "customerEmail": "customer@example.com"
        });
        let err = consumer.handle_order_canceled(payload).await.unwrap_err();

        assert!(matches!(err, SagaError::ReservationsNotFound(_)));
        // Not a validation failure: nothing dead-lettered
        assert!(bus.published_to(topics::DEAD_LETTER_TOPIC).await.is_empty());
    }
}
