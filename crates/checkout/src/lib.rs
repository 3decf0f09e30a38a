//! Order/payment orchestration.
//!
//! This crate sequences the order-to-payment workflow: basket → order,
//! order → payment-ready, payment-ready → approved, approved → refunded.
//! Each step runs under a per-order lock, validates locally before the
//! single outbound provider call, and persists only after the provider
//! confirms. A failed remote call always leaves order and payment state
//! exactly as the step found it.

pub mod coordinator;
pub mod error;
pub mod locks;

pub use coordinator::CheckoutCoordinator;
pub use error::{CheckoutError, Result};
pub use locks::OrderLocks;
