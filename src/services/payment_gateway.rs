use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::config::RazorpayConfig;
use crate::utils::crypto::{constant_time_eq, hmac_sha256_hex};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,
    #[error("invalid gateway base url: {0}")]
    BaseUrl(#[from] url::ParseError),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

/// External payment processor. Amounts are always minor currency units.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<Order, GatewayError>;

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

#[derive(Clone)]
pub struct RazorpayGateway {
    client: Client,
    key_id: String,
    key_secret: String,
    orders_url: Url,
}

impl RazorpayGateway {
    pub fn new(config: &RazorpayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        // joined relative to the base, so keep any path prefix it carries
        let base = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))?;
        Ok(Self {
            client,
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            orders_url: base.join("v1/orders")?,
        })
    }
}

/// `hex(HMAC-SHA256(order_id|payment_id))` keyed by the merchant secret.
pub fn checkout_signature(secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    let message = format!("{order_id}|{payment_id}");
    hmac_sha256_hex(secret.as_bytes(), message.as_bytes()).ok()
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<Order, GatewayError> {
        let resp = self
            .client
            .post(self.orders_url.clone())
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
                "payment_capture": 1,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let order = resp
            .json::<Order>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        tracing::info!(order_id = %order.id, amount = order.amount, "gateway order created");
        Ok(order)
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        match checkout_signature(&self.key_secret, order_id, payment_id) {
            Some(expected) => constant_time_eq(&expected, signature),
            None => false,
        }
    }
}

/// Stands in when no gateway credentials are configured; every order fails.
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_order(&self, _: i64, _: &str, _: &str) -> Result<Order, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn verify_signature(&self, _: &str, _: &str, _: &str) -> bool {
        false
    }
}
