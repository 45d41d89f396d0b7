//! Event payloads exchanged with the order and payment services.
//!
//! Field names follow the camelCase wire contract of the surrounding
//! services, so every payload struct carries `rename_all = "camelCase"`.

use common::{OrderId, ProductId, StoreId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

/// Delivery address carried on order events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDetails {
    pub governorate: String,
    pub city: String,
    pub address: String,
}

/// Card details inside a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub number: String,
    pub cvv: String,
    pub expiry: String,
}

/// The payment method attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub details: PaymentDetails,
}

/// A single line of an order: which product, from which store, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub store_id: StoreId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(store_id: StoreId, product_id: ProductId, quantity: u32, price: Money) -> Self {
        Self {
            store_id,
            product_id,
            quantity,
            price,
        }
    }
}

/// Inbound event announcing a newly created order.
///
/// Consumed from the order service's stream; triggers the reservation saga.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub saga_event_type: String,
    pub status: String,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub address_details: AddressDetails,
    pub payment_amount: Money,
    pub order_items: Vec<OrderItem>,
    pub payment_method: PaymentMethod,
}

impl OrderCreated {
    /// Checks the payload for conditions deserialization alone cannot catch.
    ///
    /// An order with no items, or an item with a zero quantity, can never be
    /// reserved and is rejected before it reaches the coordinator.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_items.is_empty() {
            return Err(ValidationError::NoItems {
                order_id: self.order_id.value(),
            });
        }
        for item in &self.order_items {
            if item.quantity == 0 {
                return Err(ValidationError::ZeroQuantity {
                    product_id: item.product_id,
                });
            }
        }
        Ok(())
    }
}

/// Order cancellation payload.
///
/// Arrives inbound when an external collaborator (e.g. the payment service)
/// cancels an order, and goes outbound both when the saga compensates a
/// shortfall and as the acknowledgement after external compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCanceled {
    pub order_id: OrderId,
    pub reason: String,
    pub customer_email: String,
}

impl OrderCanceled {
    /// Creates a cancellation payload.
    pub fn new(order_id: OrderId, reason: impl Into<String>, customer_email: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
            customer_email: customer_email.into(),
        }
    }

    /// Builds the cancellation emitted when a product cannot be fully
    /// reserved, with the reason text naming the offending product.
    pub fn insufficient_stock(order: &OrderCreated, product_id: ProductId) -> Self {
        Self::new(
            order.order_id,
            format!("Not enough inventory for product {product_id}"),
            order.customer_email.clone(),
        )
    }
}

/// Outbound event announcing that the store fully reserved an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreUpdated {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub status: String,
    pub customer_email: String,
    pub customer_name: String,
    pub customer_contact: String,
    pub address_details: AddressDetails,
    pub payment_amount: Money,
    pub payment_method: PaymentMethod,
    pub merchant_email: String,
}

impl StoreUpdated {
    /// Builds the event published after every item of `order` was reserved,
    /// carrying the order's customer and payment data forward.
    pub fn for_reserved_order(order: &OrderCreated, merchant_email: impl Into<String>) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id,
            status: "RESERVED".to_string(),
            customer_email: order.customer_email.clone(),
            customer_name: order.customer_name.clone(),
            customer_contact: order.customer_contact.clone(),
            address_details: order.address_details.clone(),
            payment_amount: order.payment_amount,
            payment_method: order.payment_method.clone(),
            merchant_email: merchant_email.into(),
        }
    }
}
