//! Payment record and related types.

mod record;
mod state;

pub use record::Payment;
pub use state::PaymentStatus;

use common::PaymentId;
use thiserror::Error;

use crate::order::Money;

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The payment has already been refunded; refund is allowed exactly once.
    #[error("Payment {payment_id} has already been refunded")]
    AlreadyRefunded { payment_id: PaymentId },

    /// The refund amount exceeds what was charged.
    #[error("Refund of {amount} exceeds charged amount {pay_amount}")]
    RefundExceedsPayment { amount: Money, pay_amount: Money },
}
