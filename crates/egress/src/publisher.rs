//! Typed publishers over the event bus.

use domain::{OrderCanceled, StoreUpdated};

use crate::bus::{EventBus, OutboundMessage};
use crate::error::Result;
use crate::partition::Partitioner;
use crate::topics;

/// Publishes `StoreUpdated` events, pinned to the partition derived from the
/// order id so downstream consumers see one order's events in order.
pub struct StoreUpdatedPublisher<B: EventBus> {
    bus: B,
    topic: String,
    partitioner: Partitioner,
}

impl<B: EventBus> StoreUpdatedPublisher<B> {
    /// Creates a publisher for the default store-updated stream.
    pub fn new(bus: B) -> Self {
        Self::with_topic(
            bus,
            topics::STORE_UPDATED_TOPIC,
            Partitioner::new(topics::STORE_UPDATED_PARTITIONS),
        )
    }

    /// Creates a publisher for a specific topic and partition layout.
    pub fn with_topic(bus: B, topic: impl Into<String>, partitioner: Partitioner) -> Self {
        Self {
            bus,
            topic: topic.into(),
            partitioner,
        }
    }

    /// Publishes a store-updated event with its order-derived partition.
    pub async fn publish(&self, event: &StoreUpdated) -> Result<()> {
        let partition = self.partitioner.partition_for(event.order_id);
        let payload = serde_json::to_value(event)?;

        tracing::info!(order_id = %event.order_id, partition, "publishing store updated event");
        metrics::counter!("store_updated_events_published_total").increment(1);

        self.bus
            .publish(OutboundMessage::with_partition(
                self.topic.clone(),
                partition,
                payload,
            ))
            .await
    }
}

/// Publishes order cancellations and cancellation acknowledgements.
///
/// No partition override: cancellation acknowledgements have no ordering
/// requirement against other events of the same order.
pub struct CancellationPublisher<B: EventBus> {
    bus: B,
    topic: String,
}

impl<B: EventBus> CancellationPublisher<B> {
    /// Creates a publisher for the default store-events stream.
    pub fn new(bus: B) -> Self {
        Self::with_topic(bus, topics::STORE_EVENTS_TOPIC)
    }

    /// Creates a publisher for a specific topic.
    pub fn with_topic(bus: B, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Publishes an order-canceled event.
    pub async fn publish(&self, event: &OrderCanceled) -> Result<()> {
        let payload = serde_json::to_value(event)?;

        tracing::info!(order_id = %event.order_id, reason = %event.reason, "publishing order canceled event");
        metrics::counter!("order_canceled_events_published_total").increment(1);

        self.bus
            .publish(OutboundMessage::new(self.topic.clone(), payload))
            .await
    }
}
