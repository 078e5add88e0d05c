// storefront/src/services/webhook_signature.rs

//! Payment webhook signatures: `t=<unix seconds>,v1=<hex hmac-sha256>` over
//! `"{t}.{raw body}"`, keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, warn};

use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
    .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {}", e)))?;
  mac.update(timestamp.to_string().as_bytes());
  mac.update(b".");
  mac.update(payload);
  Ok(mac)
}

/// Checks `header` against `payload`. Any one matching `v1` entry is enough.
pub fn verify(payload: &[u8], header: &str, secret: &str, tolerance_secs: i64, now: i64) -> Result<()> {
  let mut timestamp: Option<i64> = None;
  let mut signatures: Vec<&str> = Vec::new();
  for part in header.split(',') {
    match part.trim().split_once('=') {
      Some(("t", value)) => timestamp = value.parse().ok(),
      Some(("v1", value)) => signatures.push(value),
      _ => {}
    }
  }

  let timestamp =
    timestamp.ok_or_else(|| AppError::WebhookSignature("Missing timestamp in signature header".to_string()))?;
  if signatures.is_empty() {
    return Err(AppError::WebhookSignature("No v1 signature in signature header".to_string()));
  }
  let stale = now.checked_sub(timestamp).map_or(true, |age| age > tolerance_secs);
  if timestamp <= 0 || stale {
    warn!(timestamp, now, "Webhook timestamp outside tolerance.");
    return Err(AppError::WebhookSignature("Timestamp outside the tolerance zone".to_string()));
  }

  for candidate in signatures {
    let Ok(bytes) = hex::decode(candidate) else {
      continue;
    };
    if mac_for(secret, timestamp, payload)?.verify_slice(&bytes).is_ok() {
      debug!("Webhook signature verified.");
      return Ok(());
    }
  }
  Err(AppError::WebhookSignature(
    "No signatures found matching the expected signature for payload".to_string(),
  ))
}

/// Builds a header value the way the payment provider signs deliveries.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String> {
  let signature = hex::encode(mac_for(secret, timestamp, payload)?.finalize().into_bytes());
  Ok(format!("t={},v1={}", timestamp, signature))
}
