// storefront/src/services/stripe.rs

//! Payment gateway over the Stripe REST API.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::services::payments::{CheckoutSession, CheckoutSessionRequest, CreatedSession, PaymentGateway};

const SESSION_EXPAND: &str = "line_items.data.price.product";

pub struct StripeGateway {
  client: reqwest::Client,
  api_base: String,
  secret_key: String,
}

impl StripeGateway {
  pub fn new(client: reqwest::Client, api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
    Self {
      client,
      api_base: api_base.into(),
      secret_key: secret_key.into(),
    }
  }

  async fn read(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body: Value = resp
      .json()
      .await
      .map_err(|e| AppError::Payment(format!("Unreadable response: {}", e)))?;
    if !status.is_success() {
      let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("request failed");
      return Err(AppError::Payment(format!("{} ({})", message, status)));
    }
    Ok(body)
  }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
  #[instrument(name = "stripe::create_checkout_session", skip_all, fields(lines = request.lines.len()))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CreatedSession> {
    let resp = self
      .client
      .post(format!("{}/v1/checkout/sessions", self.api_base))
      .bearer_auth(&self.secret_key)
      .form(&request.to_form_params())
      .send()
      .await
      .map_err(|e| AppError::Payment(format!("Checkout session request failed: {}", e)))?;

    let body = Self::read(resp).await?;
    let created: CreatedSession = serde_json::from_value(body)
      .map_err(|e| AppError::Payment(format!("Unexpected checkout session response: {}", e)))?;
    info!(session_id = %created.id, "Checkout session created.");
    Ok(created)
  }

  #[instrument(name = "stripe::retrieve_checkout_session", skip(self))]
  async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
    let resp = self
      .client
      .get(format!("{}/v1/checkout/sessions/{}", self.api_base, session_id))
      .bearer_auth(&self.secret_key)
      .query(&[("expand[]", SESSION_EXPAND)])
      .send()
      .await
      .map_err(|e| AppError::Payment(format!("Checkout session lookup failed: {}", e)))?;

    let body = Self::read(resp).await?;
    serde_json::from_value(body).map_err(|e| AppError::Payment(format!("Unexpected checkout session payload: {}", e)))
  }
}
