//! Payment gateway trait and response types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::TransactionId;
use domain::{Money, Order};

use crate::GatewayError;

/// Result of a successful `ready` call: the provider has registered the
/// purchase attempt and wants the user sent to its redirect URL.
#[derive(Debug, Clone)]
pub struct ReadyResponse {
    /// The provider-assigned transaction id correlating this purchase.
    pub transaction_id: TransactionId,

    /// Where the user completes the off-system authorization.
    pub redirect_url: String,

    /// When the provider registered the attempt.
    pub created_at: DateTime<Utc>,
}

/// Result of a successful `approve` call: the charge went through.
#[derive(Debug, Clone)]
pub struct ApproveResponse {
    /// The provider's transaction id for the settled charge.
    pub transaction_id: TransactionId,

    /// The charge label as recorded by the provider.
    pub item_name: String,

    /// The charged amount as confirmed by the provider.
    pub amount_total: Money,

    /// When the provider approved the charge.
    pub approved_at: DateTime<Utc>,
}

/// Result of a successful `cancel` call: the charge was refunded.
#[derive(Debug, Clone)]
pub struct CancelResponse {
    /// The refunded amount as confirmed by the provider.
    pub canceled_amount: Money,

    /// When the provider canceled the charge.
    pub canceled_at: DateTime<Utc>,
}

/// Client for the external payment provider.
///
/// Implementations are stateless from the caller's point of view and
/// safely shared across concurrent orchestrator steps. Each method is a
/// single attempt; the provider itself rejects replays of consumed
/// tokens, and the orchestrator decides what is retriable.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers a purchase attempt for the order and returns where to
    /// send the user for authorization.
    async fn ready(&self, order: &Order) -> Result<ReadyResponse, GatewayError>;

    /// Approves the charge once the user authorized it off-system.
    async fn approve(
        &self,
        transaction_id: &TransactionId,
        pg_token: &str,
        order: &Order,
    ) -> Result<ApproveResponse, GatewayError>;

    /// Cancels (refunds) a settled charge for the given amount.
    async fn cancel(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<CancelResponse, GatewayError>;
}
