//! Payment provider integration.
//!
//! Orders are paid through the provider's hosted checkout page: the API
//! creates a checkout session carrying the order id in its metadata, the
//! customer pays on the provider's page, and the provider calls back with a
//! `checkout.session.completed` webhook that confirms the order.
//!
//! The gateway is a trait so tests can swap in a stub without network
//! access; the base URL is configurable for the same reason.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PaymentConfig;
use crate::models::{Address, Order};

/// Payment provider failures.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The HTTP call to the provider failed.
    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered with a non-success status.
    #[error("payment provider rejected the request: {0}")]
    Rejected(String),
}

/// A created hosted-checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session id, later echoed back in the completion webhook.
    pub id: String,
    /// Hosted payment page to redirect the customer to.
    pub url: String,
}

/// Creates hosted checkout sessions for orders.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_checkout_session(&self, order: &Order)
        -> Result<CheckoutSession, PaymentError>;
}

/// Stripe-shaped gateway speaking the checkout-sessions form API.
pub struct StripeGateway {
    client: Client,
    config: PaymentConfig,
}

impl StripeGateway {
    #[must_use]
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        order: &Order,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("success_url".to_owned(), self.config.success_url.clone()),
            ("cancel_url".to_owned(), self.config.cancel_url.clone()),
            ("metadata[orderId]".to_owned(), order.id.to_string()),
        ];
        for (i, item) in order.items.iter().enumerate() {
            form.push((
                format!("line_items[{i}][quantity]"),
                item.quantity.to_string(),
            ));
            form.push((format!("line_items[{i}][price_data][currency]"), "usd".to_owned()));
            form.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.price.cents().to_string(),
            ));
            form.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                format!(
                    "{} {} ({}, size {})",
                    item.shoe_brand, item.shoe_model, item.color, item.size
                ),
            ));
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected(body));
        }
        Ok(response.json::<CheckoutSession>().await?)
    }
}

/// An incoming provider webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

/// Payload wrapper inside a webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: SessionObject,
}

/// The checkout session object carried by a completion event.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionObject {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
}

impl SessionObject {
    /// Shipping address collected by the hosted page, when complete enough
    /// to record.
    #[must_use]
    pub fn shipping_address(&self) -> Option<Address> {
        let addr = self.customer_details.as_ref()?.address.as_ref()?;
        Some(Address {
            line1: addr.line1.clone()?,
            line2: addr.line2.clone(),
            city: addr.city.clone()?,
            postal_code: addr.postal_code.clone()?,
            country: addr.country.clone()?,
        })
    }
}

/// Customer details on a checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub address: Option<ProviderAddress>,
}

/// Address shape used by the provider; every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderAddress {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn webhook_event_parses() {
        let raw = json!({
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "metadata": { "orderId": "7b9f1f9a-9a8d-4c57-8a74-2f3bd5d3c001" },
                    "customer_details": {
                        "address": {
                            "line1": "1 Main St",
                            "city": "Bangkok",
                            "postal_code": "10110",
                            "country": "TH"
                        }
                    }
                }
            }
        });
        let event: WebhookEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object.id, "cs_test_123");
        let address = event.data.object.shipping_address().unwrap();
        assert_eq!(address.city, "Bangkok");
    }

    #[test]
    fn incomplete_address_is_dropped() {
        let raw = json!({
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "customer_details": { "address": { "line1": "1 Main St" } }
                }
            }
        });
        let event: WebhookEvent = serde_json::from_value(raw).unwrap();
        assert!(event.data.object.shipping_address().is_none());
        assert!(event.data.object.metadata.is_empty());
    }
}
