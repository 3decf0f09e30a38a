//! Gateway error types.

use thiserror::Error;

/// Errors returned by the payment gateway client.
///
/// Provider messages and status codes are preserved, not swallowed, so
/// the caller can decide whether a retry makes sense.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider could not be reached, timed out, or returned a
    /// non-success status on `ready`. Local state is never mutated when
    /// this is returned, so the whole step is safely retriable.
    #[error("Payment provider unavailable: {reason}")]
    Unavailable {
        reason: String,
        status: Option<u16>,
    },

    /// The provider rejected an approval (bad token, unknown transaction,
    /// or a token already consumed by a previous approval).
    #[error("Payment approval rejected (status {status}): {message}")]
    Approval { status: u16, message: String },

    /// The provider rejected a cancellation (e.g. the amount exceeds the
    /// remaining refundable balance).
    #[error("Refund rejected (status {status}): {message}")]
    Refund { status: u16, message: String },

    /// The provider responded with a payload we could not interpret.
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}
