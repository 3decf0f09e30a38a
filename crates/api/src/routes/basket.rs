//! Basket seeding endpoint.
//!
//! Basket management proper is outside this core; this endpoint exists so
//! the order-to-payment workflow can be driven end-to-end.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use common::StoreId;
use domain::{BasketLine, Money, OrderLine};
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::{BasketStore, MarketStore};
use uuid::Uuid;

use crate::error::ApiError;

use super::{AppState, user_id_from_headers};

#[derive(Deserialize)]
pub struct AddBasketLineRequest {
    pub store_id: Uuid,
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct AddBasketLineResponse {
    pub status: &'static str,
}

/// POST /basket — appends a line to the caller's basket.
#[tracing::instrument(skip(state, headers, req))]
pub async fn add<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Json(req): Json<AddBasketLineRequest>,
) -> Result<(axum::http::StatusCode, Json<AddBasketLineResponse>), ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;

    let line = BasketLine::new(
        StoreId::from_uuid(req.store_id),
        OrderLine::new(
            req.product_id,
            req.product_name,
            req.quantity,
            Money::from_cents(req.unit_price_cents),
        ),
    );

    state
        .coordinator
        .store()
        .add_basket_line(user_id, line)
        .await
        .map_err(|e| ApiError::Checkout(e.into()))?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(AddBasketLineResponse { status: "added" }),
    ))
}
