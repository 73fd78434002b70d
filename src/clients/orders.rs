//! HTTP client for the external order-submission endpoint.
//!
//! The endpoint is a third-party service that receives the serialized
//! order and answers `{ "success": bool, "message"?: string }`. Transport
//! failures, non-2xx statuses, and explicit `success: false` replies all
//! surface as typed errors so checkout can stay on the form step.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::checkout::{CustomerDetails, ShippingZone};

/// One submitted line item.
#[derive(Clone, Debug, Serialize)]
pub struct OrderItem {
    pub id: String,
    pub name: String,
    pub qty: u32,
    pub price: u64,
}

/// Outbound order payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub items: Vec<OrderItem>,
    pub total: u64,
    pub details: CustomerDetails,
    pub shipping_zone: ShippingZone,
    pub discount: u64,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Errors surfaced by the order endpoint.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Network or TLS failure, or a non-2xx HTTP status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint replied with something other than the expected shape.
    #[error("order endpoint replied with a malformed body: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// The endpoint processed the request and declined it.
    #[error("order rejected: {0}")]
    Rejected(String),
}

/// Client for the order-submission endpoint.
pub struct OrderClient {
    client: Client,
    endpoint: String,
}

impl OrderClient {
    /// Creates a client for the configured endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, OrderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("sinopec-bd-storefront/0.1")
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Submits an order and returns the endpoint's confirmation message.
    ///
    /// # Errors
    ///
    /// - [`OrderError::Rejected`] when the endpoint answers `success: false`.
    /// - [`OrderError::Http`] on transport failure or a non-2xx status.
    /// - [`OrderError::Deserialize`] when the body is not the expected shape.
    pub async fn submit(&self, order: &OrderRequest) -> Result<Option<String>, OrderError> {
        let body = self
            .client
            .post(&self.endpoint)
            .json(order)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let reply: OrderResponse = serde_json::from_str(&body)?;
        if reply.success {
            Ok(reply.message)
        } else {
            Err(OrderError::Rejected(reply.message.unwrap_or_else(|| {
                "Order was not accepted".to_string()
            })))
        }
    }
}
