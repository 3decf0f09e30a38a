//! Domain layer for the marketplace order/payment core.
//!
//! This crate provides the central entities of the order-to-payment
//! workflow:
//! - the immutable-line-item Order aggregate with its status state machine
//! - the Payment record created on gateway approval, refundable exactly once
//! - value objects (integer-cent Money, OrderLine, DiscountRate)
//! - the composed audit stamp attached to aggregates

pub mod audit;
pub mod order;
pub mod payment;
pub mod user;

pub use audit::AuditStamp;
pub use order::{
    BasketLine, DiscountRate, Money, Order, OrderError, OrderLine, OrderStatus, ProductId,
};
pub use payment::{Payment, PaymentError, PaymentStatus};
pub use user::User;
