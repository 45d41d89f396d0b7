//! Inbound event ingestion endpoints.
//!
//! Broker consumer provisioning is out of scope for this service; these
//! endpoints are the delivery seam through which the transport hands raw
//! payloads to the saga.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use egress::EventBus;
use ledger::{ReservationLedger, StockLedger};
use saga::SagaOutcome;
use serde::Serialize;
use serde_json::Value;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SagaOutcomeResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_reserved: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<SagaOutcome> for SagaOutcomeResponse {
    fn from(outcome: SagaOutcome) -> Self {
        match outcome {
            SagaOutcome::Completed { items_reserved } => Self {
                outcome: "COMPLETED",
                items_reserved: Some(items_reserved),
                reason: None,
            },
            SagaOutcome::Compensated { reason } => Self {
                outcome: "COMPENSATED",
                items_reserved: None,
                reason: Some(reason),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationResponse {
    pub released: usize,
}

/// POST /events/order-created — deliver an order-creation payload.
#[tracing::instrument(skip(state, payload))]
pub async fn order_created<L, B>(
    State(state): State<Arc<AppState<L, B>>>,
    Json(payload): Json<Value>,
) -> Result<Json<SagaOutcomeResponse>, ApiError>
where
    L: StockLedger + ReservationLedger + Clone + 'static,
    B: EventBus + Clone + 'static,
{
    let outcome = state.consumer.handle_order_created(payload).await?;
    Ok(Json(outcome.into()))
}

/// POST /events/order-canceled — deliver an external cancellation payload.
#[tracing::instrument(skip(state, payload))]
pub async fn order_canceled<L, B>(
    State(state): State<Arc<AppState<L, B>>>,
    Json(payload): Json<Value>,
) -> Result<Json<CancellationResponse>, ApiError>
where
    L: StockLedger + ReservationLedger + Clone + 'static,
    B: EventBus + Clone + 'static,
{
    let released = state.consumer.handle_order_canceled(payload).await?;
    Ok(Json(CancellationResponse { released }))
}
