// storefront/src/services/resend.rs

//! Mailer over the Resend HTTP API.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::{AppError, Result};
use crate::services::email::{EmailMessage, Mailer};

const RESEND_EMAILS_URL: &str = "https://api.resend.com/emails";

pub struct ResendMailer {
  client: reqwest::Client,
  api_key: String,
}

impl ResendMailer {
  pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
    Self {
      client,
      api_key: api_key.into(),
    }
  }
}

#[async_trait]
impl Mailer for ResendMailer {
  #[instrument(name = "resend::send", skip_all, fields(to = %message.to))]
  async fn send(&self, message: &EmailMessage) -> Result<String> {
    let resp = self
      .client
      .post(RESEND_EMAILS_URL)
      .bearer_auth(&self.api_key)
      .json(message)
      .send()
      .await
      .map_err(|e| AppError::Email(format!("Email request failed: {}", e)))?;

    let status = resp.status();
    let body: Value = resp
      .json()
      .await
      .map_err(|e| AppError::Email(format!("Unreadable email response: {}", e)))?;
    if !status.is_success() {
      let message = body.get("message").and_then(Value::as_str).unwrap_or("send failed");
      return Err(AppError::Email(format!("{} ({})", message, status)));
    }

    let id = body.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
    debug!(message_id = %id, "Email accepted.");
    Ok(id)
  }
}
