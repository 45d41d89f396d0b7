//! Event bus seam and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{EgressError, Result};

/// A message headed for the bus: destination topic, optional explicit
/// partition, and the serialized payload.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub topic: String,
    pub partition: Option<i32>,
    pub payload: Value,
}

impl OutboundMessage {
    /// Creates a message with broker-default partition distribution.
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            payload,
        }
    }

    /// Creates a message pinned to an explicit partition.
    pub fn with_partition(topic: impl Into<String>, partition: i32, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            partition: Some(partition),
            payload,
        }
    }
}

/// Trait for the outbound side of the message bus.
///
/// The broker client behind this seam must honor the explicit partition
/// override when one is set; everything else about transport configuration
/// lives outside this service.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes one message.
    async fn publish(&self, message: OutboundMessage) -> Result<()>;
}

#[derive(Debug, Default)]
struct BusState {
    published: Vec<OutboundMessage>,
    fail_on_publish: bool,
}

/// In-memory event bus that records published messages for inspection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    state: Arc<RwLock<BusState>>,
}

impl InMemoryEventBus {
    /// Creates a new in-memory event bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every message published so far, in publish order.
    pub async fn published(&self) -> Vec<OutboundMessage> {
        self.state.read().await.published.clone()
    }

    /// Returns the messages published to one topic.
    pub async fn published_to(&self, topic: &str) -> Vec<OutboundMessage> {
        self.state
            .read()
            .await
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Returns the total number of published messages.
    pub async fn publish_count(&self) -> usize {
        self.state.read().await.published.len()
    }

    /// Configures the bus to fail the next publishes.
    pub async fn set_fail_on_publish(&self, fail: bool) {
        self.state.write().await.fail_on_publish = fail;
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, message: OutboundMessage) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_publish {
            return Err(EgressError::Publish("bus unavailable".to_string()));
        }
        state.published.push(message);
        Ok(())
    }
}
