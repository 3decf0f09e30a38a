//! Order aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::Order;
pub use state::OrderStatus;
pub use value_objects::{BasketLine, DiscountRate, Money, OrderLine, ProductId};

use common::TransactionId;
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The basket had no lines to order.
    #[error("Basket is empty")]
    EmptyBasket,

    /// The basket referenced more than one store.
    #[error("Basket spans {stores} stores; an order may reference only one")]
    CrossStoreBasket { stores: usize },

    /// Line quantity below the minimum.
    #[error("Invalid quantity: {quantity} (must be at least 1)")]
    InvalidQuantity { quantity: u32 },

    /// Line unit price below zero.
    #[error("Invalid unit price: {price} cents (must not be negative)")]
    InvalidPrice { price: i64 },

    /// Discount rate outside 0-100.
    #[error("Invalid discount rate: {rate} (must be between 0 and 100)")]
    InvalidDiscountRate { rate: u8 },

    /// The order is not in the expected status.
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// A different gateway transaction is already attached to the order.
    #[error("Payment already initiated with transaction {existing}")]
    PaymentAlreadyInitiated { existing: TransactionId },

    /// The order carries no gateway transaction yet.
    #[error("Payment has not been initiated for this order")]
    PaymentNotInitiated,
}
