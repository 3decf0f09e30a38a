//! In-memory payment gateway for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, TransactionId};
use domain::{Money, Order};

use crate::{
    GatewayError,
    client::{ApproveResponse, CancelResponse, PaymentGateway, ReadyResponse},
};

#[derive(Debug)]
struct TxRecord {
    order_id: OrderId,
    amount: Money,
    remaining: Money,
    approved: bool,
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    transactions: HashMap<String, TxRecord>,
    next_id: u32,
    next_transaction_id: Option<String>,
    fail_on_ready: bool,
    fail_on_approve: bool,
    fail_on_cancel: bool,
}

/// In-memory payment gateway, mimicking the provider's protocol:
/// sequential transaction ids, one approval per token, and a
/// refundable-balance check on cancel.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail the next `ready` calls.
    pub fn set_fail_on_ready(&self, fail: bool) {
        self.state.write().unwrap().fail_on_ready = fail;
    }

    /// Configures the gateway to fail the next `approve` calls.
    pub fn set_fail_on_approve(&self, fail: bool) {
        self.state.write().unwrap().fail_on_approve = fail;
    }

    /// Configures the gateway to fail the next `cancel` calls.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cancel = fail;
    }

    /// Forces the next `ready` call to return the given transaction id
    /// instead of a generated one.
    pub fn set_next_transaction_id(&self, tid: impl Into<String>) {
        self.state.write().unwrap().next_transaction_id = Some(tid.into());
    }

    /// Returns the number of registered transactions.
    pub fn transaction_count(&self) -> usize {
        self.state.read().unwrap().transactions.len()
    }

    /// Returns true if the transaction has been approved.
    pub fn is_approved(&self, transaction_id: &TransactionId) -> bool {
        self.state
            .read()
            .unwrap()
            .transactions
            .get(transaction_id.as_str())
            .is_some_and(|tx| tx.approved)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn ready(&self, order: &Order) -> Result<ReadyResponse, GatewayError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_ready {
            return Err(GatewayError::Unavailable {
                reason: "provider unreachable".to_string(),
                status: None,
            });
        }

        let tid = match state.next_transaction_id.take() {
            Some(tid) => tid,
            None => {
                state.next_id += 1;
                format!("T-{:04}", state.next_id)
            }
        };

        // Re-issuing the same tid keeps the original registration.
        state.transactions.entry(tid.clone()).or_insert(TxRecord {
            order_id: order.id(),
            amount: order.total_pay(),
            remaining: order.total_pay(),
            approved: false,
        });

        Ok(ReadyResponse {
            transaction_id: TransactionId::new(tid.clone()),
            redirect_url: format!("https://pay.example.com/redirect/{tid}"),
            created_at: Utc::now(),
        })
    }

    async fn approve(
        &self,
        transaction_id: &TransactionId,
        pg_token: &str,
        order: &Order,
    ) -> Result<ApproveResponse, GatewayError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_approve {
            return Err(GatewayError::Approval {
                status: 400,
                message: "payment declined".to_string(),
            });
        }

        if pg_token.is_empty() {
            return Err(GatewayError::Approval {
                status: 400,
                message: "invalid authorization token".to_string(),
            });
        }

        let tx = state
            .transactions
            .get_mut(transaction_id.as_str())
            .ok_or_else(|| GatewayError::Approval {
                status: 404,
                message: format!("unknown transaction {transaction_id}"),
            })?;

        if tx.approved {
            return Err(GatewayError::Approval {
                status: 409,
                message: "authorization token already consumed".to_string(),
            });
        }

        tx.approved = true;

        Ok(ApproveResponse {
            transaction_id: transaction_id.clone(),
            item_name: order.item_name(),
            amount_total: tx.amount,
            approved_at: Utc::now(),
        })
    }

    async fn cancel(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<CancelResponse, GatewayError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_cancel {
            return Err(GatewayError::Refund {
                status: 502,
                message: "provider rejected the cancellation".to_string(),
            });
        }

        let tx = state
            .transactions
            .get_mut(transaction_id.as_str())
            .ok_or_else(|| GatewayError::Refund {
                status: 404,
                message: format!("unknown transaction {transaction_id}"),
            })?;

        if !tx.approved {
            return Err(GatewayError::Refund {
                status: 400,
                message: "transaction has not been approved".to_string(),
            });
        }

        if amount > tx.remaining {
            return Err(GatewayError::Refund {
                status: 400,
                message: "cancel amount exceeds remaining balance".to_string(),
            });
        }

        tx.remaining -= amount;

        Ok(CancelResponse {
            canceled_amount: amount,
            canceled_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{StoreId, UserId};
    use domain::{BasketLine, DiscountRate, OrderLine};

    fn sample_order() -> Order {
        Order::from_basket(
            UserId::new(),
            vec![BasketLine::new(
                StoreId::new(),
                OrderLine::new("SKU-001", "Fried Chicken", 2, Money::from_cents(5000)),
            )],
            DiscountRate::ZERO,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn ready_approve_cancel_roundtrip() {
        let gateway = InMemoryGateway::new();
        let order = sample_order();

        let ready = gateway.ready(&order).await.unwrap();
        assert_eq!(ready.transaction_id.as_str(), "T-0001");
        assert!(ready.redirect_url.contains("T-0001"));

        let approve = gateway
            .approve(&ready.transaction_id, "pg-token", &order)
            .await
            .unwrap();
        assert_eq!(approve.amount_total.cents(), 10000);
        assert!(gateway.is_approved(&ready.transaction_id));

        let cancel = gateway
            .cancel(&ready.transaction_id, approve.amount_total)
            .await
            .unwrap();
        assert_eq!(cancel.canceled_amount.cents(), 10000);
    }

    #[tokio::test]
    async fn sequential_transaction_ids() {
        let gateway = InMemoryGateway::new();
        let order = sample_order();

        let r1 = gateway.ready(&order).await.unwrap();
        let r2 = gateway.ready(&order).await.unwrap();
        assert_eq!(r1.transaction_id.as_str(), "T-0001");
        assert_eq!(r2.transaction_id.as_str(), "T-0002");
    }

    #[tokio::test]
    async fn consumed_token_is_rejected() {
        let gateway = InMemoryGateway::new();
        let order = sample_order();

        let ready = gateway.ready(&order).await.unwrap();
        gateway
            .approve(&ready.transaction_id, "pg-token", &order)
            .await
            .unwrap();

        let replay = gateway
            .approve(&ready.transaction_id, "pg-token", &order)
            .await;
        assert!(matches!(
            replay,
            Err(GatewayError::Approval { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn cancel_above_remaining_balance_is_rejected() {
        let gateway = InMemoryGateway::new();
        let order = sample_order();

        let ready = gateway.ready(&order).await.unwrap();
        gateway
            .approve(&ready.transaction_id, "pg-token", &order)
            .await
            .unwrap();

        let result = gateway
            .cancel(&ready.transaction_id, Money::from_cents(99999))
            .await;
        assert!(matches!(
            result,
            Err(GatewayError::Refund { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn fail_switches() {
        let gateway = InMemoryGateway::new();
        let order = sample_order();

        gateway.set_fail_on_ready(true);
        assert!(matches!(
            gateway.ready(&order).await,
            Err(GatewayError::Unavailable { .. })
        ));
        assert_eq!(gateway.transaction_count(), 0);

        gateway.set_fail_on_ready(false);
        let ready = gateway.ready(&order).await.unwrap();

        gateway.set_fail_on_approve(true);
        assert!(matches!(
            gateway.approve(&ready.transaction_id, "pg-token", &order).await,
            Err(GatewayError::Approval { .. })
        ));
    }

    #[tokio::test]
    async fn forced_transaction_id_is_reused() {
        let gateway = InMemoryGateway::new();
        let order = sample_order();

        gateway.set_next_transaction_id("T-FIXED");
        let r1 = gateway.ready(&order).await.unwrap();
        assert_eq!(r1.transaction_id.as_str(), "T-FIXED");

        gateway.set_next_transaction_id("T-FIXED");
        let r2 = gateway.ready(&order).await.unwrap();
        assert_eq!(r2.transaction_id.as_str(), "T-FIXED");
        assert_eq!(gateway.transaction_count(), 1);
    }
}
