//! Reservation ledger: the durable log of per-item stock holds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// The status of a reservation.
///
/// State transitions:
/// ```text
/// ∅ ──► Reserved ──► Canceled
/// ```
/// `Canceled` is terminal; there is no edge back to `Reserved` and no edge
/// that skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Stock is held for the order item.
    Reserved,

    /// The hold was reversed and the stock restored (terminal state).
    Canceled,
}

impl ReservationStatus {
    /// Returns true if the reservation can still be compensated.
    pub fn can_cancel(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Canceled)
    }

    /// Returns the status name as stored in the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "RESERVED",
            ReservationStatus::Canceled => "CANCELED",
        }
    }

    /// Parses a stored status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RESERVED" => Some(ReservationStatus::Reserved),
            "CANCELED" => Some(ReservationStatus::Canceled),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A durable record that a quantity of stock is provisionally allocated to
/// an order. One reservation per successfully reserved item; many share one
/// order id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub reserved_quantity: i64,
    pub status: ReservationStatus,
    pub last_updated: DateTime<Utc>,
}

impl Reservation {
    /// Creates a fresh `Reserved` record for an order item.
    pub fn new(order_id: OrderId, product_id: ProductId, reserved_quantity: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            reserved_quantity,
            status: ReservationStatus::Reserved,
            last_updated: Utc::now(),
        }
    }
}

/// Durable append/update log of reservations.
#[async_trait]
pub trait ReservationLedger: Send + Sync {
    /// Appends a reservation record.
    async fn append(&self, reservation: Reservation) -> Result<()>;

    /// Returns every reservation ever recorded for the order, regardless of
    /// status, oldest first.
    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Reservation>>;

    /// Flips a reservation from `Reserved` to `Canceled`.
    ///
    /// Conditional: returns `true` only when this call performed the flip.
    /// A reservation already `Canceled` is left untouched and reported as
    /// `false`, which is what makes compensation idempotent.
    async fn mark_canceled(&self, id: Uuid) -> Result<bool>;
}
