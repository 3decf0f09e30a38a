//! Payment workflow endpoints: ready, approval callback, refund, history.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use common::{PaymentId, TransactionId};
use domain::Payment;
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::{BasketStore, MarketStore};
use uuid::Uuid;

use crate::error::ApiError;

use super::orders::parse_order_id;
use super::{AppState, user_id_from_headers};

// -- Request types --

#[derive(Deserialize)]
pub struct ReadyRequest {
    pub order_id: String,
}

#[derive(Deserialize)]
pub struct ApproveQuery {
    pub pg_token: String,
    pub tid: String,
}

#[derive(Deserialize)]
pub struct RefundRequest {
    pub order_id: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReadyResponseBody {
    pub transaction_id: String,
    pub redirect_url: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: String,
    pub transaction_id: String,
    pub item_name: String,
    pub status: String,
    pub pay_amount_cents: i64,
    pub refund_amount_cents: Option<i64>,
    pub approved_at: String,
    pub canceled_at: Option<String>,
}

#[derive(Serialize)]
pub struct RefundResponseBody {
    pub message: &'static str,
    pub payment: PaymentResponse,
}

fn payment_to_response(payment: &Payment) -> PaymentResponse {
    PaymentResponse {
        id: payment.id().to_string(),
        order_id: payment.order_id().to_string(),
        transaction_id: payment.transaction_id().to_string(),
        item_name: payment.item_name().to_string(),
        status: payment.status().to_string(),
        pay_amount_cents: payment.pay_amount().cents(),
        refund_amount_cents: payment.refund_amount().map(|m| m.cents()),
        approved_at: payment.approved_at().to_rfc3339(),
        canceled_at: payment.canceled_at().map(|t| t.to_rfc3339()),
    }
}

// -- Handlers --

/// POST /pays/ready — initiates payment for an order.
#[tracing::instrument(skip(state, headers, req))]
pub async fn ready<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Json(req): Json<ReadyRequest>,
) -> Result<(axum::http::StatusCode, Json<ReadyResponseBody>), ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;
    let order_id = parse_order_id(&req.order_id)?;

    let ready = state.coordinator.ready_to_pay(user_id, order_id).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ReadyResponseBody {
            transaction_id: ready.transaction_id.to_string(),
            redirect_url: ready.redirect_url,
            created_at: ready.created_at.to_rfc3339(),
        }),
    ))
}

/// GET /pays/success — provider redirect after the user authorized the
/// charge; approves the payment.
#[tracing::instrument(skip(state, headers, query))]
pub async fn success<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Query(query): Query<ApproveQuery>,
) -> Result<Json<PaymentResponse>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;
    let transaction_id = TransactionId::new(query.tid);

    let payment = state
        .coordinator
        .approve_pay(user_id, &query.pg_token, &transaction_id)
        .await?;

    Ok(Json(payment_to_response(&payment)))
}

/// POST /pays/refund — refunds a paid order in full.
#[tracing::instrument(skip(state, headers, req))]
pub async fn refund<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Json(req): Json<RefundRequest>,
) -> Result<Json<RefundResponseBody>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;
    let order_id = parse_order_id(&req.order_id)?;

    let payment = state.coordinator.refund(user_id, order_id).await?;

    Ok(Json(RefundResponseBody {
        message: "refund completed",
        payment: payment_to_response(&payment),
    }))
}

/// GET /pays — lists the caller's payments, most recent first.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PaymentResponse>>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;

    let payments = state.coordinator.payment_history(user_id).await?;
    Ok(Json(payments.iter().map(payment_to_response).collect()))
}

/// GET /pays/{id} — loads one of the caller's payments.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user_id = user_id_from_headers(&headers)?;
    let payment_id = Uuid::parse_str(&id)
        .map(PaymentId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid payment id: {e}")))?;

    let payment = state.coordinator.get_payment(user_id, payment_id).await?;
    Ok(Json(payment_to_response(&payment)))
}
