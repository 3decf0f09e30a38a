//! HTTP implementation of the payment gateway client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::TransactionId;
use domain::{Money, Order};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    GatewayError,
    client::{ApproveResponse, CancelResponse, PaymentGateway, ReadyResponse},
};

/// Configuration for the HTTP gateway client.
///
/// The secret authorizes us against the provider and must never appear in
/// logs; `Debug` redacts it.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL of the provider API.
    pub base_url: String,

    /// Provider-assigned channel id (`cid`), fixed per deployment.
    pub channel_id: String,

    /// Shared secret sent as the bearer-style Authorization header.
    pub secret: String,

    /// Upper bound on each provider call.
    pub timeout: Duration,

    /// Callback the provider redirects to after the user authorizes.
    pub approval_url: String,

    /// Callback for a user-canceled authorization.
    pub cancel_url: String,

    /// Callback for a failed authorization.
    pub fail_url: String,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("channel_id", &self.channel_id)
            .field("secret", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("approval_url", &self.approval_url)
            .field("cancel_url", &self.cancel_url)
            .field("fail_url", &self.fail_url)
            .finish()
    }
}

// -- Provider wire shapes --

#[derive(Serialize)]
struct ReadyParams<'a> {
    cid: &'a str,
    partner_order_id: String,
    partner_user_id: String,
    item_name: String,
    quantity: u32,
    total_amount: i64,
    vat_amount: i64,
    tax_free_amount: i64,
    approval_url: &'a str,
    cancel_url: &'a str,
    fail_url: &'a str,
}

#[derive(Deserialize)]
struct ReadyWire {
    tid: String,
    redirect_url: String,
    created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ApproveParams<'a> {
    cid: &'a str,
    tid: &'a str,
    partner_order_id: String,
    partner_user_id: String,
    pg_token: &'a str,
}

#[derive(Deserialize)]
struct ApproveWire {
    tid: String,
    item_name: String,
    total_amount: i64,
    approved_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CancelParams<'a> {
    cid: &'a str,
    tid: &'a str,
    cancel_amount: i64,
    cancel_tax_free_amount: i64,
}

#[derive(Deserialize)]
struct CancelWire {
    canceled_amount: i64,
    canceled_at: DateTime<Utc>,
}

/// Payment gateway client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HttpPaymentGateway {
    /// Creates a new HTTP gateway client.
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn post_form<P: Serialize>(
        &self,
        path: &str,
        params: &P,
    ) -> Result<(StatusCode, String), GatewayError> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.config.secret),
            )
            .timeout(self.config.timeout)
            .form(params)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable {
                reason: if e.is_timeout() {
                    format!("request to {path} timed out")
                } else {
                    e.to_string()
                },
                status: None,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Unavailable {
                reason: e.to_string(),
                status: Some(status.as_u16()),
            })?;

        Ok((status, body))
    }

    fn parse<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
        serde_json::from_str(body)
            .map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn ready(&self, order: &Order) -> Result<ReadyResponse, GatewayError> {
        let params = ReadyParams {
            cid: &self.config.channel_id,
            partner_order_id: order.id().to_string(),
            partner_user_id: order.user_id().to_string(),
            item_name: order.item_name(),
            quantity: order.total_quantity(),
            total_amount: order.total_pay().cents(),
            vat_amount: 0,
            tax_free_amount: 0,
            approval_url: &self.config.approval_url,
            cancel_url: &self.config.cancel_url,
            fail_url: &self.config.fail_url,
        };

        let (status, body) = self.post_form("/v1/payment/ready", &params).await?;
        if !status.is_success() {
            return Err(GatewayError::Unavailable {
                reason: body,
                status: Some(status.as_u16()),
            });
        }

        let wire: ReadyWire = Self::parse(&body)?;
        tracing::debug!(order_id = %order.id(), tid = %wire.tid, "payment ready registered");

        Ok(ReadyResponse {
            transaction_id: TransactionId::new(wire.tid),
            redirect_url: wire.redirect_url,
            created_at: wire.created_at,
        })
    }

    async fn approve(
        &self,
        transaction_id: &TransactionId,
        pg_token: &str,
        order: &Order,
    ) -> Result<ApproveResponse, GatewayError> {
        let params = ApproveParams {
            cid: &self.config.channel_id,
            tid: transaction_id.as_str(),
            partner_order_id: order.id().to_string(),
            partner_user_id: order.user_id().to_string(),
            pg_token,
        };

        let (status, body) = self.post_form("/v1/payment/approve", &params).await?;
        if !status.is_success() {
            return Err(GatewayError::Approval {
                status: status.as_u16(),
                message: body,
            });
        }

        let wire: ApproveWire = Self::parse(&body)?;
        tracing::debug!(order_id = %order.id(), tid = %wire.tid, "payment approved");

        Ok(ApproveResponse {
            transaction_id: TransactionId::new(wire.tid),
            item_name: wire.item_name,
            amount_total: Money::from_cents(wire.total_amount),
            approved_at: wire.approved_at,
        })
    }

    async fn cancel(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<CancelResponse, GatewayError> {
        let params = CancelParams {
            cid: &self.config.channel_id,
            tid: transaction_id.as_str(),
            cancel_amount: amount.cents(),
            cancel_tax_free_amount: 0,
        };

        let (status, body) = self.post_form("/v1/payment/cancel", &params).await?;
        if !status.is_success() {
            return Err(GatewayError::Refund {
                status: status.as_u16(),
                message: body,
            });
        }

        let wire: CancelWire = Self::parse(&body)?;
        tracing::debug!(tid = %transaction_id, "payment canceled");

        Ok(CancelResponse {
            canceled_amount: Money::from_cents(wire.canceled_amount),
            canceled_at: wire.canceled_at,
        })
    }
}
