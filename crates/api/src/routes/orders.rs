//! Order placement and fulfillment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use common::OrderId;
use domain::{DiscountRate, Order};
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::{BasketStore, MarketStore};
use uuid::Uuid;

use crate::error::ApiError;

use super::{AppState, user_id_from_headers};

// -- Request types --

#[derive(Deserialize, Default)]
pub struct CreateOrderRequest {
    /// Promotion rate in whole percent; absent means no discount.
    #[serde(default)]
    pub discount_rate: Option<u8>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderLineResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub store_id: String,
    pub status: String,
    pub ordered_at: String,
    pub lines: Vec<OrderLineResponse>,
    pub subtotal_cents: i64,
    pub discount_rate: u8,
    pub discount_amount_cents: i64,
    pub total_pay_cents: i64,
    pub transaction_id: Option<String>,
}

pub(crate) fn order_to_response(order: &Order) -> OrderResponse {
    OrderResponse {
        id: order.id().to_string(),
        user_id: order.user_id().to_string(),
        store_id: order.store_id().to_string(),
        status: order.status().to_string(),
        ordered_at: order.ordered_at().to_rfc3339(),
        lines: order
            .lines()
            .iter()
            .map(|line| OrderLineResponse {
                product_id: line.product_id.to_string(),
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
            })
            .collect(),
        subtotal_cents: order.subtotal().cents(),
        discount_rate: order.discount_rate().rate(),
        discount_amount_cents: order.discount_amount().cents(),
        total_pay_cents: order.total_pay().cents(),
        transaction_id: order.transaction_id().map(|t| t.to_string()),
    }
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}

// -- Handlers --

/// POST /orders — converts the caller's basket into an order.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(axum::http::StatusCode, Json<OrderResponse>), ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;

    let discount_rate = match req.discount_rate {
        Some(rate) => DiscountRate::new(rate).map_err(checkout::CheckoutError::from)?,
        None => DiscountRate::ZERO,
    };

    let order = state
        .coordinator
        .place_order_with_discount(user_id, discount_rate)
        .await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(order_to_response(&order)),
    ))
}

/// GET /orders/{id} — loads one of the caller's orders.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.coordinator.get_order(user_id, order_id).await?;
    Ok(Json(order_to_response(&order)))
}

/// POST /orders/{id}/accept — store-side acceptance of a paid order.
#[tracing::instrument(skip(state, headers))]
pub async fn accept<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let actor = user_id_from_headers(&headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.coordinator.accept_order(actor, order_id).await?;
    Ok(Json(order_to_response(&order)))
}

/// POST /orders/{id}/reject — store-side rejection of a paid order.
#[tracing::instrument(skip(state, headers))]
pub async fn reject<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let actor = user_id_from_headers(&headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.coordinator.reject_order(actor, order_id).await?;
    Ok(Json(order_to_response(&order)))
}

/// POST /orders/{id}/complete — marks an accepted order as delivered.
#[tracing::instrument(skip(state, headers))]
pub async fn complete<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let actor = user_id_from_headers(&headers)?;
    let order_id = parse_order_id(&id)?;

    let order = state.coordinator.complete_order(actor, order_id).await?;
    Ok(Json(order_to_response(&order)))
}
