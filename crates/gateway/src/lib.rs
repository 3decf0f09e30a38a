//! Typed client for the external payment provider.
//!
//! Translates internal requests into the provider's parameter shape and
//! its responses back into domain types, isolating the orchestrator from
//! provider-specific payloads. All three calls (ready, approve, cancel)
//! are synchronous and single-attempt here; retry policy belongs to the
//! caller, never to this layer.

pub mod client;
pub mod error;
pub mod http;
pub mod mock;

pub use client::{ApproveResponse, CancelResponse, PaymentGateway, ReadyResponse};
pub use error::GatewayError;
pub use http::{GatewayConfig, HttpPaymentGateway};
pub use mock::InMemoryGateway;
