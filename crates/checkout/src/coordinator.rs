//! Checkout coordinator orchestrating the order-to-payment workflow.

use common::{OrderId, PaymentId, TransactionId, UserId};
use domain::{DiscountRate, Order, OrderError, Payment, PaymentError};
use gateway::{PaymentGateway, ReadyResponse};
use store::{BasketStore, MarketStore, StoreError};

use crate::error::{CheckoutError, Result};
use crate::locks::OrderLocks;

/// Orchestrates basket → order → payment-ready → approved → refunded.
///
/// Each step is triggered by one inbound request and runs to completion
/// under the order's lock. Local validation happens before the single
/// provider call, and nothing is persisted until the provider confirms,
/// so a failed or timed-out call leaves order and payment state exactly
/// as the step found it and the caller may simply retry.
pub struct CheckoutCoordinator<S, G>
where
    S: MarketStore + BasketStore,
    G: PaymentGateway,
{
    store: S,
    gateway: G,
    locks: OrderLocks,
}

impl<S, G> CheckoutCoordinator<S, G>
where
    S: MarketStore + BasketStore,
    G: PaymentGateway,
{
    /// Creates a new coordinator.
    pub fn new(store: S, gateway: G) -> Self {
        Self {
            store,
            gateway,
            locks: OrderLocks::new(),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Converts the user's basket into an order with no discount.
    pub async fn place_order(&self, user_id: UserId) -> Result<Order> {
        self.place_order_with_discount(user_id, DiscountRate::ZERO)
            .await
    }

    /// Converts the user's basket into an order, applying a promotion rate.
    ///
    /// Takes the basket atomically; if order validation rejects the basket
    /// (empty, cross-store, bad line) the lines are put back so the
    /// rejection does not consume them.
    #[tracing::instrument(skip(self))]
    pub async fn place_order_with_discount(
        &self,
        user_id: UserId,
        discount_rate: DiscountRate,
    ) -> Result<Order> {
        let user = self.store.load_user(user_id).await?;
        let basket = self.store.take_basket(user.id).await?;

        let mut order = match Order::from_basket(user.id, basket.clone(), discount_rate) {
            Ok(order) => order,
            Err(e) => {
                for line in basket {
                    self.store.add_basket_line(user.id, line).await?;
                }
                return Err(e.into());
            }
        };

        let version = self.store.save_order(&order).await?;
        order.set_version(version);

        metrics::counter!("checkout_orders_placed").increment(1);
        tracing::info!(order_id = %order.id(), total_pay = %order.total_pay(), "order placed");

        Ok(order)
    }

    /// Initiates payment for an order: registers the purchase with the
    /// provider and persists the returned transaction id.
    ///
    /// Only the order's owner may initiate payment, and only from the
    /// `Created` status. A retry after a lost response is idempotent as
    /// long as the provider returns the same transaction id.
    #[tracing::instrument(skip(self))]
    pub async fn ready_to_pay(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<ReadyResponse> {
        let _guard = self.locks.acquire(order_id).await;
        let step_start = std::time::Instant::now();

        let user = self.store.load_user(user_id).await?;
        let mut order = self.store.load_order(order_id).await?;

        if order.user_id() != user.id {
            return Err(CheckoutError::OrderOwnership { order_id, user_id });
        }
        if !order.status().can_initiate_payment() {
            return Err(OrderError::InvalidStateTransition {
                current_status: order.status(),
                action: "initiate payment",
            }
            .into());
        }

        // Remote call; on failure the order is left untouched in Created.
        let ready = self.gateway.ready(&order).await?;

        order.mark_ready_for_payment(ready.transaction_id.clone(), user_id)?;
        self.store.save_order(&order).await?;

        metrics::counter!("payment_ready_total").increment(1);
        metrics::histogram!("checkout_step_duration_seconds")
            .record(step_start.elapsed().as_secs_f64());
        tracing::info!(%order_id, tid = %ready.transaction_id, "payment ready");

        Ok(ready)
    }

    /// Approves a payment after the user authorized it off-system.
    ///
    /// The order is resolved through the callback's transaction id; a
    /// replayed or unknown callback fails with `NoOrderForTransaction`.
    /// Exactly one payment is recorded per order: a duplicate approval
    /// fails with `PaymentAlreadyExists` before reaching the provider.
    #[tracing::instrument(skip(self, pg_token))]
    pub async fn approve_pay(
        &self,
        user_id: UserId,
        pg_token: &str,
        transaction_id: &TransactionId,
    ) -> Result<Payment> {
        // Resolve the order first; the authoritative re-read happens under
        // the order lock.
        let resolved = self.store.load_order_by_transaction_id(transaction_id).await?;
        let order_id = resolved.id();

        let _guard = self.locks.acquire(order_id).await;
        let step_start = std::time::Instant::now();

        let mut order = self.store.load_order(order_id).await?;
        if order.user_id() != user_id {
            return Err(CheckoutError::OrderOwnership { order_id, user_id });
        }

        match self.store.load_payment_for_order(order_id).await {
            Ok(_) => return Err(CheckoutError::PaymentAlreadyExists(order_id)),
            Err(StoreError::PaymentNotFoundForOrder(_)) => {}
            Err(e) => return Err(e.into()),
        }

        if !order.status().can_mark_paid() {
            return Err(OrderError::InvalidStateTransition {
                current_status: order.status(),
                action: "mark paid",
            }
            .into());
        }
        if order.transaction_id().is_none() {
            return Err(OrderError::PaymentNotInitiated.into());
        }

        // Remote call; on failure no payment is created and the order stays
        // in Created.
        let approval = self.gateway.approve(transaction_id, pg_token, &order).await?;

        let payment = Payment::approved(
            order_id,
            approval.transaction_id,
            approval.item_name,
            approval.amount_total,
            approval.approved_at,
        );
        self.store.save_payment(&payment).await?;

        order.mark_paid(user_id)?;
        self.store.save_order(&order).await?;

        metrics::counter!("payment_approved").increment(1);
        metrics::histogram!("checkout_step_duration_seconds")
            .record(step_start.elapsed().as_secs_f64());
        tracing::info!(%order_id, payment_id = %payment.id(), amount = %payment.pay_amount(), "payment approved");

        Ok(payment)
    }

    /// Refunds a paid order in full and cancels it.
    ///
    /// The refund amount is always the full charged amount; the provider's
    /// cancel response is authoritative for the recorded figures. Committed
    /// only after the provider confirms, so the operation is safely
    /// retriable on gateway failure.
    #[tracing::instrument(skip(self))]
    pub async fn refund(&self, user_id: UserId, order_id: OrderId) -> Result<Payment> {
        let _guard = self.locks.acquire(order_id).await;
        let step_start = std::time::Instant::now();

        let mut order = self.store.load_order(order_id).await?;
        if order.user_id() != user_id {
            return Err(CheckoutError::OrderOwnership { order_id, user_id });
        }

        let mut payment = self.store.load_payment_for_order(order_id).await?;
        if !payment.status().can_refund() {
            return Err(PaymentError::AlreadyRefunded {
                payment_id: payment.id(),
            }
            .into());
        }
        if !order.status().can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_status: order.status(),
                action: "cancel",
            }
            .into());
        }

        let cancel_amount = payment.pay_amount();

        // Remote call; on failure both order and payment are left untouched.
        let result = self
            .gateway
            .cancel(payment.transaction_id(), cancel_amount)
            .await?;

        payment.mark_refunded(result.canceled_amount, result.canceled_at)?;
        order.mark_canceled(user_id)?;

        self.store.save_payment(&payment).await?;
        self.store.save_order(&order).await?;

        metrics::counter!("payment_refunded").increment(1);
        metrics::histogram!("checkout_step_duration_seconds")
            .record(step_start.elapsed().as_secs_f64());
        tracing::info!(%order_id, payment_id = %payment.id(), refunded = %result.canceled_amount, "payment refunded");

        Ok(payment)
    }

    /// Store-side: accepts a paid order.
    #[tracing::instrument(skip(self))]
    pub async fn accept_order(&self, actor: UserId, order_id: OrderId) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.store.load_order(order_id).await?;
        order.accept(actor)?;
        let version = self.store.save_order(&order).await?;
        order.set_version(version);
        Ok(order)
    }

    /// Store-side: rejects a paid order.
    #[tracing::instrument(skip(self))]
    pub async fn reject_order(&self, actor: UserId, order_id: OrderId) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.store.load_order(order_id).await?;
        order.reject(actor)?;
        let version = self.store.save_order(&order).await?;
        order.set_version(version);
        Ok(order)
    }

    /// Store-side: marks an accepted order as delivered.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(&self, actor: UserId, order_id: OrderId) -> Result<Order> {
        let _guard = self.locks.acquire(order_id).await;

        let mut order = self.store.load_order(order_id).await?;
        order.complete(actor)?;
        let version = self.store.save_order(&order).await?;
        order.set_version(version);
        Ok(order)
    }

    /// Loads an order, enforcing ownership.
    pub async fn get_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order> {
        let order = self.store.load_order(order_id).await?;
        if order.user_id() != user_id {
            return Err(CheckoutError::OrderOwnership { order_id, user_id });
        }
        Ok(order)
    }

    /// Lists the user's payments, most recent first.
    pub async fn payment_history(&self, user_id: UserId) -> Result<Vec<Payment>> {
        self.store.load_user(user_id).await?;
        Ok(self.store.list_payments_for_user(user_id).await?)
    }

    /// Loads a single payment, enforcing ownership through its order.
    pub async fn get_payment(&self, user_id: UserId, payment_id: PaymentId) -> Result<Payment> {
        let payment = self.store.load_payment(payment_id).await?;
        let order = self.store.load_order(payment.order_id()).await?;
        if order.user_id() != user_id {
            return Err(CheckoutError::OrderOwnership {
                order_id: order.id(),
                user_id,
            });
        }
        Ok(payment)
    }
}
