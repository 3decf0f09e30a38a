//! Per-order mutual exclusion for orchestrator steps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use common::OrderId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed async mutex over order ids.
///
/// Every ready/approve/refund step for a given order runs while holding
/// this lock, so concurrent steps on the same order serialize; steps on
/// different orders proceed independently. Store-level version checks and
/// the payment uniqueness constraint back this up for anything that
/// bypasses the lock.
#[derive(Clone, Default)]
pub struct OrderLocks {
    inner: Arc<Mutex<HashMap<OrderId, Arc<AsyncMutex<()>>>>>,
}

impl OrderLocks {
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for an order, waiting if another step holds it.
    pub async fn acquire(&self, order_id: OrderId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap();
            map.entry(order_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_order_serializes() {
        let locks = OrderLocks::new();
        let order_id = OrderId::new();

        let guard = locks.acquire(order_id).await;

        let locks2 = locks.clone();
        let handle = tokio::spawn(async move {
            let _guard = locks2.acquire(order_id).await;
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        drop(guard);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn different_orders_do_not_block() {
        let locks = OrderLocks::new();

        let _a = locks.acquire(OrderId::new()).await;
        let _b = locks.acquire(OrderId::new()).await;
    }
}
