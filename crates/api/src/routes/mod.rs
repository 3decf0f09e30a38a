//! Route handlers.

pub mod basket;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod pays;
pub mod users;

use axum::http::HeaderMap;
use checkout::CheckoutCoordinator;
use common::UserId;
use gateway::PaymentGateway;
use store::{BasketStore, MarketStore};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, G>
where
    S: MarketStore + BasketStore,
    G: PaymentGateway,
{
    pub coordinator: CheckoutCoordinator<S, G>,
}

/// Extracts the acting user from the `x-user-id` header.
///
/// Authentication happens upstream of this service; handlers only thread
/// the already-resolved actor into the orchestrator, never an ambient
/// session.
pub(crate) fn user_id_from_headers(headers: &HeaderMap) -> Result<UserId, ApiError> {
    let value = headers
        .get("x-user-id")
        .ok_or_else(|| ApiError::BadRequest("Missing x-user-id header".to_string()))?;
    let raw = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("Invalid x-user-id header".to_string()))?;
    let uuid = uuid::Uuid::parse_str(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid x-user-id: {e}")))?;
    Ok(UserId::from_uuid(uuid))
}
