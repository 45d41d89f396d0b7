//! Stock admin endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{ProductId, StoreId};
use egress::EventBus;
use ledger::{ReservationLedger, Stock, StockLedger};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockRequest {
    pub store_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub store_id: i64,
    pub product_id: i64,
    pub available_quantity: i64,
    pub last_updated: DateTime<Utc>,
}

impl From<Stock> for StockResponse {
    fn from(stock: Stock) -> Self {
        Self {
            store_id: stock.store_id.value(),
            product_id: stock.product_id.value(),
            available_quantity: stock.available_quantity,
            last_updated: stock.last_updated,
        }
    }
}

// -- Handlers --

/// POST /stock — create a stock row, or top an existing one up.
///
/// The product must be known to the catalog; an unknown product is rejected
/// before any ledger write.
#[tracing::instrument(skip(state, req))]
pub async fn create<L, B>(
    State(state): State<Arc<AppState<L, B>>>,
    Json(req): Json<CreateStockRequest>,
) -> Result<(axum::http::StatusCode, Json<StockResponse>), ApiError>
where
    L: StockLedger + ReservationLedger + Clone + 'static,
    B: EventBus + Clone + 'static,
{
    let product_id = ProductId::new(req.product_id);
    state
        .catalog
        .lookup_product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {product_id} not found")))?;

    let stock = state
        .ledger
        .upsert(StoreId::new(req.store_id), product_id, req.quantity)
        .await?;

    Ok((axum::http::StatusCode::CREATED, Json(stock.into())))
}

/// GET /stock/:store_id/:product_id — look one stock row up.
#[tracing::instrument(skip(state))]
pub async fn get<L, B>(
    State(state): State<Arc<AppState<L, B>>>,
    Path((store_id, product_id)): Path<(i64, i64)>,
) -> Result<Json<StockResponse>, ApiError>
where
    L: StockLedger + ReservationLedger + Clone + 'static,
    B: EventBus + Clone + 'static,
{
    let stock = state
        .ledger
        .get(StoreId::new(store_id), ProductId::new(product_id))
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Stock not found for store {store_id}, product {product_id}"
            ))
        })?;

    Ok(Json(stock.into()))
}

/// GET /stores/:store_id/stock — list a store's stock rows.
#[tracing::instrument(skip(state))]
pub async fn list_by_store<L, B>(
    State(state): State<Arc<AppState<L, B>>>,
    Path(store_id): Path<i64>,
) -> Result<Json<Vec<StockResponse>>, ApiError>
where
    L: StockLedger + ReservationLedger + Clone + 'static,
    B: EventBus + Clone + 'static,
{
    let stocks = state.ledger.list_by_store(StoreId::new(store_id)).await?;
    Ok(Json(stocks.into_iter().map(Into::into).collect()))
}

/// PUT /stock/:store_id/:product_id/quantity — set an absolute quantity.
#[tracing::instrument(skip(state, req))]
pub async fn set_quantity<L, B>(
    State(state): State<Arc<AppState<L, B>>>,
    Path((store_id, product_id)): Path<(i64, i64)>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<StockResponse>, ApiError>
where
    L: StockLedger + ReservationLedger + Clone + 'static,
    B: EventBus + Clone + 'static,
{
    let stock = state
        .ledger
        .set_quantity(
            StoreId::new(store_id),
            ProductId::new(product_id),
            req.quantity,
        )
        .await?;

    Ok(Json(stock.into()))
}
