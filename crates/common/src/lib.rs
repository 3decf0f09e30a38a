//! Shared identifier types used across the order/payment crates.

mod types;

pub use types::{OrderId, PaymentId, StoreId, TransactionId, UserId};
