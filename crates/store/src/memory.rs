//! In-memory store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PaymentId, TransactionId, UserId};
use domain::{BasketLine, Order, Payment, User};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{BasketStore, MarketStore},
};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<UserId, User>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<PaymentId, Payment>,
    payments_by_order: HashMap<OrderId, PaymentId>,
    baskets: HashMap<UserId, Vec<BasketLine>>,
}

/// In-memory store used by tests and the default server wiring.
///
/// Provides the same conflict semantics as the PostgreSQL implementation:
/// version-checked order saves and one-payment-per-order enforcement.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns the number of stored payments.
    pub async fn payment_count(&self) -> usize {
        self.inner.read().await.payments.len()
    }

    /// Clears all stored state.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.users.clear();
        inner.orders.clear();
        inner.payments.clear();
        inner.payments_by_order.clear();
        inner.baskets.clear();
    }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn load_user(&self, id: UserId) -> Result<User> {
        let inner = self.inner.read().await;
        inner
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::UserNotFound(id))
    }

    async fn save_user(&self, user: User) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id, user);
        Ok(())
    }

    async fn load_order(&self, id: OrderId) -> Result<Order> {
        let inner = self.inner.read().await;
        inner
            .orders
            .get(&id)
            .cloned()
            .ok_or(StoreError::OrderNotFound(id))
    }

    async fn save_order(&self, order: &Order) -> Result<u64> {
        let mut inner = self.inner.write().await;

        let actual = inner.orders.get(&order.id()).map(|o| o.version()).unwrap_or(0);
        if actual != order.version() {
            return Err(StoreError::VersionConflict {
                order_id: order.id(),
                expected: order.version(),
                actual,
            });
        }

        let mut stored = order.clone();
        stored.set_version(actual + 1);
        let new_version = stored.version();
        inner.orders.insert(stored.id(), stored);
        Ok(new_version)
    }

    async fn load_order_by_transaction_id(&self, transaction_id: &TransactionId) -> Result<Order> {
        let inner = self.inner.read().await;
        let matches: Vec<&Order> = inner
            .orders
            .values()
            .filter(|o| o.transaction_id() == Some(transaction_id))
            .collect();

        match matches.len() {
            0 => Err(StoreError::NoOrderForTransaction(transaction_id.clone())),
            1 => Ok(matches[0].clone()),
            n => Err(StoreError::AmbiguousTransaction {
                transaction_id: transaction_id.clone(),
                matches: n,
            }),
        }
    }

    async fn load_payment_for_order(&self, order_id: OrderId) -> Result<Payment> {
        let inner = self.inner.read().await;
        inner
            .payments_by_order
            .get(&order_id)
            .and_then(|id| inner.payments.get(id))
            .cloned()
            .ok_or(StoreError::PaymentNotFoundForOrder(order_id))
    }

    async fn load_payment(&self, id: PaymentId) -> Result<Payment> {
        let inner = self.inner.read().await;
        inner
            .payments
            .get(&id)
            .cloned()
            .ok_or(StoreError::PaymentNotFound(id))
    }

    async fn save_payment(&self, payment: &Payment) -> Result<()> {
        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.payments_by_order.get(&payment.order_id())
            && *existing != payment.id()
        {
            return Err(StoreError::PaymentAlreadyExists(payment.order_id()));
        }

        inner
            .payments_by_order
            .insert(payment.order_id(), payment.id());
        inner.payments.insert(payment.id(), payment.clone());
        Ok(())
    }

    async fn list_payments_for_user(&self, user_id: UserId) -> Result<Vec<Payment>> {
        let inner = self.inner.read().await;
        let mut payments: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| {
                inner
                    .orders
                    .get(&p.order_id())
                    .is_some_and(|o| o.user_id() == user_id)
            })
            .cloned()
            .collect();
        payments.sort_by_key(|p| std::cmp::Reverse(p.approved_at()));
        Ok(payments)
    }
}

#[async_trait]
impl BasketStore for InMemoryStore {
    async fn add_basket_line(&self, user_id: UserId, line: BasketLine) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.baskets.entry(user_id).or_default().push(line);
        Ok(())
    }

    async fn take_basket(&self, user_id: UserId) -> Result<Vec<BasketLine>> {
        let mut inner = self.inner.write().await;
        Ok(inner.baskets.remove(&user_id).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::StoreId;
    use domain::{DiscountRate, Money, OrderLine};

    fn sample_order(user_id: UserId) -> Order {
        let store_id = StoreId::new();
        Order::from_basket(
            user_id,
            vec![BasketLine::new(
                store_id,
                OrderLine::new("SKU-001", "Fried Chicken", 2, Money::from_cents(5000)),
            )],
            DiscountRate::ZERO,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_and_load_order() {
        let store = InMemoryStore::new();
        let order = sample_order(UserId::new());

        let version = store.save_order(&order).await.unwrap();
        assert_eq!(version, 1);

        let loaded = store.load_order(order.id()).await.unwrap();
        assert_eq!(loaded.id(), order.id());
        assert_eq!(loaded.version(), 1);
        assert_eq!(loaded.total_pay().cents(), 10000);
    }

    #[tokio::test]
    async fn load_missing_order_fails() {
        let store = InMemoryStore::new();
        let result = store.load_order(OrderId::new()).await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn stale_save_is_a_version_conflict() {
        let store = InMemoryStore::new();
        let order = sample_order(UserId::new());
        store.save_order(&order).await.unwrap();

        // Simulates a concurrent step saving from a stale snapshot.
        let result = store.save_order(&order).await;
        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
    }

    #[tokio::test]
    async fn transaction_lookup_resolves_single_order() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut order = sample_order(user_id);
        order
            .mark_ready_for_payment("T100".into(), user_id)
            .unwrap();
        store.save_order(&order).await.unwrap();

        let loaded = store
            .load_order_by_transaction_id(&"T100".into())
            .await
            .unwrap();
        assert_eq!(loaded.id(), order.id());

        let missing = store.load_order_by_transaction_id(&"T999".into()).await;
        assert!(matches!(missing, Err(StoreError::NoOrderForTransaction(_))));
    }

    #[tokio::test]
    async fn ambiguous_transaction_fails_closed() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();

        for _ in 0..2 {
            let mut order = sample_order(user_id);
            order
                .mark_ready_for_payment("T100".into(), user_id)
                .unwrap();
            store.save_order(&order).await.unwrap();
        }

        let result = store.load_order_by_transaction_id(&"T100".into()).await;
        assert!(matches!(
            result,
            Err(StoreError::AmbiguousTransaction { matches: 2, .. })
        ));
    }

    #[tokio::test]
    async fn second_payment_for_order_is_rejected() {
        let store = InMemoryStore::new();
        let order = sample_order(UserId::new());
        store.save_order(&order).await.unwrap();

        let first = Payment::approved(
            order.id(),
            "T100".into(),
            "Fried Chicken",
            Money::from_cents(10000),
            Utc::now(),
        );
        store.save_payment(&first).await.unwrap();

        let duplicate = Payment::approved(
            order.id(),
            "T100".into(),
            "Fried Chicken",
            Money::from_cents(10000),
            Utc::now(),
        );
        let result = store.save_payment(&duplicate).await;
        assert!(matches!(result, Err(StoreError::PaymentAlreadyExists(_))));
        assert_eq!(store.payment_count().await, 1);
    }

    #[tokio::test]
    async fn updating_the_same_payment_is_allowed() {
        let store = InMemoryStore::new();
        let order = sample_order(UserId::new());
        store.save_order(&order).await.unwrap();

        let mut payment = Payment::approved(
            order.id(),
            "T100".into(),
            "Fried Chicken",
            Money::from_cents(10000),
            Utc::now(),
        );
        store.save_payment(&payment).await.unwrap();

        payment
            .mark_refunded(Money::from_cents(10000), Utc::now())
            .unwrap();
        store.save_payment(&payment).await.unwrap();

        let loaded = store.load_payment_for_order(order.id()).await.unwrap();
        assert_eq!(loaded.status(), domain::PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn take_basket_clears_atomically() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let store_id = StoreId::new();

        store
            .add_basket_line(
                user_id,
                BasketLine::new(
                    store_id,
                    OrderLine::new("SKU-001", "Fried Chicken", 1, Money::from_cents(1000)),
                ),
            )
            .await
            .unwrap();

        let taken = store.take_basket(user_id).await.unwrap();
        assert_eq!(taken.len(), 1);

        let again = store.take_basket(user_id).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn payments_listed_by_owner() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let other = UserId::new();

        let order = sample_order(owner);
        store.save_order(&order).await.unwrap();
        let payment = Payment::approved(
            order.id(),
            "T100".into(),
            "Fried Chicken",
            Money::from_cents(10000),
            Utc::now(),
        );
        store.save_payment(&payment).await.unwrap();

        assert_eq!(store.list_payments_for_user(owner).await.unwrap().len(), 1);
        assert!(store.list_payments_for_user(other).await.unwrap().is_empty());
    }
}
