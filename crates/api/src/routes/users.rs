//! User registration endpoint.
//!
//! The rest of user management (and authentication) lives outside this
//! core; the workflow only needs a user record to order against.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::UserId;
use domain::User;
use gateway::PaymentGateway;
use serde::{Deserialize, Serialize};
use store::{BasketStore, MarketStore};

use crate::error::ApiError;

use super::AppState;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
}

/// POST /users — registers a user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(axum::http::StatusCode, Json<UserResponse>), ApiError>
where
    S: MarketStore + BasketStore + 'static,
    G: PaymentGateway + 'static,
{
    let user = User::new(UserId::new(), req.name);
    state
        .coordinator
        .store()
        .save_user(user.clone())
        .await
        .map_err(|e| ApiError::Checkout(e.into()))?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(UserResponse {
            id: user.id.to_string(),
            name: user.name,
        }),
    ))
}
