//! Storage traits consumed by the orchestrator.

use async_trait::async_trait;
use common::{OrderId, PaymentId, TransactionId, UserId};
use domain::{BasketLine, Order, Payment, User};

use crate::Result;

/// Persistence gateway for orders, payments, and users.
///
/// Each orchestrator step performs its reads and writes through this trait;
/// implementations must be thread-safe (`Send + Sync`) and must detect
/// conflicting concurrent writes:
///
/// - [`save_order`](MarketStore::save_order) checks the order's version
///   counter and fails with `VersionConflict` when another step committed
///   in between.
/// - [`save_payment`](MarketStore::save_payment) enforces at most one
///   payment per order and fails with `PaymentAlreadyExists` otherwise.
/// - [`load_order_by_transaction_id`](MarketStore::load_order_by_transaction_id)
///   fails closed with `AmbiguousTransaction` if the id maps to more than
///   one order.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Loads a user by id.
    async fn load_user(&self, id: UserId) -> Result<User>;

    /// Inserts or updates a user record.
    async fn save_user(&self, user: User) -> Result<()>;

    /// Loads an order by id.
    async fn load_order(&self, id: OrderId) -> Result<Order>;

    /// Persists an order, bumping its version counter.
    ///
    /// Returns the stored version. The order's line items are written once
    /// at creation and never updated afterwards.
    async fn save_order(&self, order: &Order) -> Result<u64>;

    /// Resolves the single order carrying the given gateway transaction id.
    async fn load_order_by_transaction_id(&self, transaction_id: &TransactionId) -> Result<Order>;

    /// Loads the payment recorded for an order.
    async fn load_payment_for_order(&self, order_id: OrderId) -> Result<Payment>;

    /// Loads a payment by id.
    async fn load_payment(&self, id: PaymentId) -> Result<Payment>;

    /// Persists a payment.
    ///
    /// Inserting a second payment for an order that already has one (under
    /// a different payment id) fails; saving an existing payment id updates
    /// it in place (the refund path).
    async fn save_payment(&self, payment: &Payment) -> Result<()>;

    /// Lists a user's payments, most recent approval first.
    async fn list_payments_for_user(&self, user_id: UserId) -> Result<Vec<Payment>>;
}

/// Storage for pending baskets.
#[async_trait]
pub trait BasketStore: Send + Sync {
    /// Appends a line to the user's basket.
    async fn add_basket_line(&self, user_id: UserId, line: BasketLine) -> Result<()>;

    /// Takes the user's basket, atomically clearing it.
    ///
    /// Returns the lines in insertion order; an empty vec if the basket is
    /// empty.
    async fn take_basket(&self, user_id: UserId) -> Result<Vec<BasketLine>>;
}
