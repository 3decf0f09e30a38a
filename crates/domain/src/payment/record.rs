//! Payment record implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, PaymentId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::order::Money;

use super::{PaymentError, PaymentStatus};

/// The record of a single successful charge against an order.
///
/// Created only on gateway approval, one-to-one with its order, and never
/// deleted; a refund is recorded as a status and amount update so the
/// audit history survives. The provider's response figures are
/// authoritative for both the charged and the refunded amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    order_id: OrderId,
    transaction_id: TransactionId,
    item_name: String,
    status: PaymentStatus,
    pay_amount: Money,
    refund_amount: Option<Money>,
    approved_at: DateTime<Utc>,
    canceled_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates the payment record for a provider-approved charge.
    pub fn approved(
        order_id: OrderId,
        transaction_id: TransactionId,
        item_name: impl Into<String>,
        pay_amount: Money,
        approved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            order_id,
            transaction_id,
            item_name: item_name.into(),
            status: PaymentStatus::Success,
            pay_amount,
            refund_amount: None,
            approved_at,
            canceled_at: None,
        }
    }

    /// Returns the payment ID.
    pub fn id(&self) -> PaymentId {
        self.id
    }

    /// Returns the order this payment charged.
    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Returns the gateway transaction id.
    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    /// Returns the charge label shown by the provider.
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// Returns the current status.
    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Returns the charged amount.
    pub fn pay_amount(&self) -> Money {
        self.pay_amount
    }

    /// Returns the refunded amount, if a refund has been recorded.
    pub fn refund_amount(&self) -> Option<Money> {
        self.refund_amount
    }

    /// Returns when the provider approved the charge.
    pub fn approved_at(&self) -> DateTime<Utc> {
        self.approved_at
    }

    /// Returns when the provider canceled the charge, if refunded.
    pub fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }

    /// Records the provider-confirmed refund.
    ///
    /// Allowed exactly once; the amount and cancellation time come from the
    /// provider's cancel response, not from local computation.
    pub fn mark_refunded(
        &mut self,
        amount: Money,
        canceled_at: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        if !self.status.can_refund() {
            return Err(PaymentError::AlreadyRefunded { payment_id: self.id });
        }
        if amount > self.pay_amount {
            return Err(PaymentError::RefundExceedsPayment {
                amount,
                pay_amount: self.pay_amount,
            });
        }

        self.status = PaymentStatus::Refunded;
        self.refund_amount = Some(amount);
        self.canceled_at = Some(canceled_at);
        Ok(())
    }

    /// Rebuilds a payment from persisted state. Intended for storage
    /// implementations.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: PaymentId,
        order_id: OrderId,
        transaction_id: TransactionId,
        item_name: String,
        status: PaymentStatus,
        pay_amount: Money,
        refund_amount: Option<Money>,
        approved_at: DateTime<Utc>,
        canceled_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            order_id,
            transaction_id,
            item_name,
            status,
            pay_amount,
            refund_amount,
            approved_at,
            canceled_at,
        }
    }
}
