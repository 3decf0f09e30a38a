//! Orchestrator error types.

use common::{OrderId, PaymentId, TransactionId, UserId};
use domain::{OrderError, PaymentError};
use gateway::GatewayError;
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the checkout coordinator.
///
/// The variants deliberately separate the classes callers treat
/// differently: validation, not-found, ownership, upstream gateway
/// failure, and conflicts from concurrent duplicate work.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No order carries the callback's transaction id (replayed or garbage
    /// callback).
    #[error("No order carries transaction {0}")]
    NoOrderForTransaction(TransactionId),

    /// The transaction id maps to more than one order; failed closed.
    #[error("Transaction {transaction_id} is attached to {matches} orders")]
    AmbiguousTransaction {
        transaction_id: TransactionId,
        matches: usize,
    },

    /// No payment recorded for the order.
    #[error("Payment not found for order {0}")]
    PaymentNotFoundForOrder(OrderId),

    /// Payment record not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// The order belongs to a different user.
    #[error("Order {order_id} does not belong to user {user_id}")]
    OrderOwnership { order_id: OrderId, user_id: UserId },

    /// Domain validation failed on the order.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Domain validation failed on the payment.
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// A payment is already recorded for the order (duplicate approval).
    #[error("Payment already recorded for order {0}")]
    PaymentAlreadyExists(OrderId),

    /// The payment provider failed or rejected the call; local state is
    /// unchanged.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Persistence failure (including version conflicts from concurrent
    /// steps).
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => CheckoutError::UserNotFound(id),
            StoreError::OrderNotFound(id) => CheckoutError::OrderNotFound(id),
            StoreError::NoOrderForTransaction(tid) => CheckoutError::NoOrderForTransaction(tid),
            StoreError::AmbiguousTransaction {
                transaction_id,
                matches,
            } => CheckoutError::AmbiguousTransaction {
                transaction_id,
                matches,
            },
            StoreError::PaymentNotFoundForOrder(id) => CheckoutError::PaymentNotFoundForOrder(id),
            StoreError::PaymentNotFound(id) => CheckoutError::PaymentNotFound(id),
            StoreError::PaymentAlreadyExists(id) => CheckoutError::PaymentAlreadyExists(id),
            other => CheckoutError::Store(other),
        }
    }
}

/// Convenience type alias for coordinator results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
