//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{OrderError, PaymentError};
use gateway::GatewayError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every failure renders as `{ "error": <message>, "kind": <machine kind> }`
/// so clients can branch on the kind without parsing messages. Internal
/// details never leak into responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Orchestrator error.
    Checkout(CheckoutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, &'static str, String) {
    match &err {
        CheckoutError::UserNotFound(_)
        | CheckoutError::OrderNotFound(_)
        | CheckoutError::NoOrderForTransaction(_)
        | CheckoutError::PaymentNotFoundForOrder(_)
        | CheckoutError::PaymentNotFound(_) => {
            (StatusCode::NOT_FOUND, "not_found", err.to_string())
        }

        CheckoutError::OrderOwnership { .. } => {
            (StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }

        CheckoutError::Order(order_err) => match order_err {
            OrderError::InvalidStateTransition { .. } => {
                (StatusCode::CONFLICT, "invalid_transition", err.to_string())
            }
            OrderError::PaymentAlreadyInitiated { .. } => (
                StatusCode::CONFLICT,
                "payment_already_initiated",
                err.to_string(),
            ),
            OrderError::PaymentNotInitiated => (
                StatusCode::CONFLICT,
                "payment_not_initiated",
                err.to_string(),
            ),
            OrderError::EmptyBasket
            | OrderError::CrossStoreBasket { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::InvalidDiscountRate { .. } => {
                (StatusCode::BAD_REQUEST, "validation", err.to_string())
            }
        },

        CheckoutError::Payment(payment_err) => match payment_err {
            PaymentError::AlreadyRefunded { .. } => {
                (StatusCode::CONFLICT, "already_refunded", err.to_string())
            }
            PaymentError::RefundExceedsPayment { .. } => {
                (StatusCode::BAD_REQUEST, "validation", err.to_string())
            }
        },

        CheckoutError::PaymentAlreadyExists(_) => (
            StatusCode::CONFLICT,
            "payment_already_exists",
            err.to_string(),
        ),

        CheckoutError::AmbiguousTransaction { .. } => (
            StatusCode::CONFLICT,
            "ambiguous_transaction",
            err.to_string(),
        ),

        CheckoutError::Gateway(GatewayError::Unavailable { .. }) => (
            StatusCode::BAD_GATEWAY,
            "gateway_unavailable",
            err.to_string(),
        ),
        CheckoutError::Gateway(_) => {
            (StatusCode::BAD_GATEWAY, "gateway_rejected", err.to_string())
        }

        CheckoutError::Store(StoreError::VersionConflict { .. }) => {
            (StatusCode::CONFLICT, "conflict", err.to_string())
        }
        CheckoutError::Store(store_err) => {
            tracing::error!(error = %store_err, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal error".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{OrderId, UserId};

    fn status_of(err: CheckoutError) -> StatusCode {
        checkout_error_to_response(err).0
    }

    #[test]
    fn error_classes_map_to_distinct_statuses() {
        assert_eq!(
            status_of(CheckoutError::OrderNotFound(OrderId::new())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(CheckoutError::OrderOwnership {
                order_id: OrderId::new(),
                user_id: UserId::new(),
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(CheckoutError::Order(OrderError::EmptyBasket)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CheckoutError::PaymentAlreadyExists(OrderId::new())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CheckoutError::Gateway(GatewayError::Unavailable {
                reason: "down".to_string(),
                status: None,
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn internal_store_errors_do_not_leak() {
        let (status, kind, message) = checkout_error_to_response(CheckoutError::Store(
            StoreError::Decode("corrupt row".to_string()),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "internal");
        assert_eq!(message, "internal error");
    }
}
