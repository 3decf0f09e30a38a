//! Order aggregate implementation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{OrderId, StoreId, TransactionId, UserId};
use serde::{Deserialize, Serialize};

use crate::audit::AuditStamp;

use super::{BasketLine, DiscountRate, Money, OrderError, OrderLine, OrderStatus};

/// Order aggregate root.
///
/// An immutable snapshot of purchased line items plus mutable
/// payment/fulfillment status. Orders are created from a basket, advanced
/// only through the defined status transitions, and never physically
/// deleted; cancellation is a status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    store_id: StoreId,
    ordered_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
    status: OrderStatus,
    discount_rate: DiscountRate,
    discount_amount: Money,
    total_pay: Money,
    transaction_id: Option<TransactionId>,
    version: u64,
    audit: AuditStamp,
}

// Query methods
impl Order {
    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the owning user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the store the order was placed against.
    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    /// Returns when the order was placed.
    pub fn ordered_at(&self) -> DateTime<Utc> {
        self.ordered_at
    }

    /// Returns the line items. Always non-empty.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the applied discount rate.
    pub fn discount_rate(&self) -> DiscountRate {
        self.discount_rate
    }

    /// Returns the discount amount deducted from the subtotal.
    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    /// Returns the amount actually charged: subtotal minus discount.
    pub fn total_pay(&self) -> Money {
        self.total_pay
    }

    /// Returns the gateway transaction id, if payment has been initiated.
    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    /// Returns the persistence version counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the persistence version counter. Used by storage implementations.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Returns the audit stamp.
    pub fn audit(&self) -> &AuditStamp {
        &self.audit
    }

    /// Returns the pre-discount subtotal of all lines.
    pub fn subtotal(&self) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.line_total())
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Returns the human-readable charge label sent to the payment provider.
    pub fn item_name(&self) -> String {
        let first = &self.lines[0];
        if self.lines.len() == 1 {
            first.product_name.clone()
        } else {
            format!("{} and {} more", first.product_name, self.lines.len() - 1)
        }
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods
impl Order {
    /// Creates a new order from a basket snapshot.
    ///
    /// Fails if the basket is empty, spans more than one store, or carries
    /// an invalid line. The discount amount and final total are fixed here;
    /// `total_pay == subtotal - discount_amount` holds by construction.
    pub fn from_basket(
        user_id: UserId,
        basket: Vec<BasketLine>,
        discount_rate: DiscountRate,
    ) -> Result<Order, OrderError> {
        if basket.is_empty() {
            return Err(OrderError::EmptyBasket);
        }

        let stores: HashSet<StoreId> = basket.iter().map(|b| b.store_id).collect();
        if stores.len() > 1 {
            return Err(OrderError::CrossStoreBasket {
                stores: stores.len(),
            });
        }
        let store_id = basket[0].store_id;

        let lines: Vec<OrderLine> = basket.into_iter().map(|b| b.line).collect();
        for line in &lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: line.quantity,
                });
            }
            if line.unit_price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    price: line.unit_price.cents(),
                });
            }
        }

        let subtotal = lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.line_total());
        let discount_amount = subtotal.percent(discount_rate.rate());

        Ok(Order {
            id: OrderId::new(),
            user_id,
            store_id,
            ordered_at: Utc::now(),
            lines,
            status: OrderStatus::Created,
            discount_rate,
            discount_amount,
            total_pay: subtotal - discount_amount,
            transaction_id: None,
            version: 0,
            audit: AuditStamp::new(user_id),
        })
    }

    /// Records the gateway transaction id after a successful `ready` call.
    ///
    /// Idempotent: re-applying the same transaction id is a no-op. A
    /// different id while one is already set is rejected, as is initiating
    /// payment outside the `Created` status.
    pub fn mark_ready_for_payment(
        &mut self,
        transaction_id: TransactionId,
        actor: UserId,
    ) -> Result<(), OrderError> {
        if let Some(existing) = &self.transaction_id {
            if *existing == transaction_id {
                return Ok(());
            }
            return Err(OrderError::PaymentAlreadyInitiated {
                existing: existing.clone(),
            });
        }

        if !self.status.can_initiate_payment() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "initiate payment",
            });
        }

        self.transaction_id = Some(transaction_id);
        self.audit.touch(actor);
        Ok(())
    }

    /// Advances the order to `Pending` after gateway approval.
    ///
    /// Requires an initiated payment. Already-`Pending` orders no-op so a
    /// duplicate approval callback cannot corrupt state.
    pub fn mark_paid(&mut self, actor: UserId) -> Result<(), OrderError> {
        match self.status {
            OrderStatus::Pending => Ok(()),
            OrderStatus::Created => {
                if self.transaction_id.is_none() {
                    return Err(OrderError::PaymentNotInitiated);
                }
                self.status = OrderStatus::Pending;
                self.audit.touch(actor);
                Ok(())
            }
            _ => Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "mark paid",
            }),
        }
    }

    /// Cancels the order as part of the refund flow. `Pending` only.
    pub fn mark_canceled(&mut self, actor: UserId) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Canceled;
        self.audit.touch(actor);
        Ok(())
    }

    /// Store-side: accepts the paid order for preparation.
    pub fn accept(&mut self, actor: UserId) -> Result<(), OrderError> {
        if !self.status.can_accept() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "accept",
            });
        }
        self.status = OrderStatus::Accepted;
        self.audit.touch(actor);
        Ok(())
    }

    /// Store-side: rejects the paid order.
    pub fn reject(&mut self, actor: UserId) -> Result<(), OrderError> {
        if !self.status.can_reject() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "reject",
            });
        }
        self.status = OrderStatus::Rejected;
        self.audit.touch(actor);
        Ok(())
    }

    /// Store-side: marks an accepted order as delivered.
    pub fn complete(&mut self, actor: UserId) -> Result<(), OrderError> {
        if !self.status.can_complete() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "complete",
            });
        }
        self.status = OrderStatus::Completed;
        self.audit.touch(actor);
        Ok(())
    }
}

// Persistence support
impl Order {
    /// Rebuilds an order from persisted state. Intended for storage
    /// implementations; domain code creates orders via `from_basket`.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        store_id: StoreId,
        ordered_at: DateTime<Utc>,
        lines: Vec<OrderLine>,
        status: OrderStatus,
        discount_rate: DiscountRate,
        discount_amount: Money,
        total_pay: Money,
        transaction_id: Option<TransactionId>,
        version: u64,
        audit: AuditStamp,
    ) -> Self {
        Self {
            id,
            user_id,
            store_id,
            ordered_at,
            lines,
            status,
            discount_rate,
            discount_amount,
            total_pay,
            transaction_id,
            version,
            audit,
        }
    }
}
