//! Storage error types.

use common::{OrderId, PaymentId, TransactionId, UserId};
use thiserror::Error;

/// Errors that can occur in the persistence gateway.
#[derive(Debug, Error)]
pub enum StoreError {
    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Order not found.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No order carries the given gateway transaction id.
    #[error("No order carries transaction {0}")]
    NoOrderForTransaction(TransactionId),

    /// More than one order carries the given transaction id. This should
    /// never legitimately happen; lookups fail closed instead of picking one.
    #[error("Transaction {transaction_id} is attached to {matches} orders")]
    AmbiguousTransaction {
        transaction_id: TransactionId,
        matches: usize,
    },

    /// No payment recorded for the order.
    #[error("Payment not found for order {0}")]
    PaymentNotFoundForOrder(OrderId),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// The order was modified by a concurrent step since it was loaded.
    #[error("Version conflict on order {order_id}: expected {expected}, actual {actual}")]
    VersionConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// A payment is already recorded for the order; at most one non-void
    /// payment may exist per order.
    #[error("Payment already recorded for order {0}")]
    PaymentAlreadyExists(OrderId),

    /// A persisted value could not be interpreted.
    #[error("Invalid persisted value: {0}")]
    Decode(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;
