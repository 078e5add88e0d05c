// storefront/src/services/auth_service.rs

//! Admin authentication: the shared admin token, KV-backed login sessions and
//! the optional UK-only country lock.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::services::kv::KvStore;

pub const SESSION_COOKIE: &str = "gim_admin_session";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

const SESSION_PREFIX: &str = "admin:session:";
const COUNTRY_HEADERS: [&str; 2] = ["x-vercel-ip-country", "cf-ipcountry"];

fn session_key(session_id: &str) -> String {
  format!("{}{}", SESSION_PREFIX, session_id)
}

/// Compares without short-circuiting on the first differing byte.
pub fn token_matches(expected: &str, provided: &str) -> bool {
  if expected.is_empty() || expected.len() != provided.len() {
    return false;
  }
  expected
    .bytes()
    .zip(provided.bytes())
    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
    == 0
}

/// The first non-empty country header, uppercased.
pub fn request_country<'a>(header: impl Fn(&str) -> Option<&'a str>) -> String {
  COUNTRY_HEADERS
    .iter()
    .filter_map(|name| header(name))
    .map(str::trim)
    .find(|v| !v.is_empty())
    .unwrap_or_default()
    .to_ascii_uppercase()
}

/// Requests without a country header are let through; only a known non-GB country is refused.
pub fn check_country(uk_only: bool, country: &str) -> Result<()> {
  if uk_only && !country.is_empty() && country != "GB" {
    warn!(%country, "Admin request refused by UK-only lock.");
    return Err(AppError::Forbidden("UK-only admin lock enabled.".to_string()));
  }
  Ok(())
}

#[derive(Clone)]
pub struct AdminSessions {
  kv: Arc<dyn KvStore>,
}

impl AdminSessions {
  pub fn new(kv: Arc<dyn KvStore>) -> Self {
    Self { kv }
  }

  /// Creates a session and returns its id (the cookie value).
  #[instrument(name = "auth_service::create_session", skip(self))]
  pub async fn create(&self) -> Result<String> {
    let session_id = Uuid::new_v4().to_string();
    self.kv.set(&session_key(&session_id), "1", Some(SESSION_TTL)).await?;
    debug!("Admin session created.");
    Ok(session_id)
  }

  #[instrument(name = "auth_service::is_valid_session", skip_all)]
  pub async fn is_valid(&self, session_id: &str) -> Result<bool> {
    if session_id.is_empty() {
      return Ok(false);
    }
    Ok(self.kv.get(&session_key(session_id)).await?.as_deref() == Some("1"))
  }

  #[instrument(name = "auth_service::delete_session", skip_all)]
  pub async fn delete(&self, session_id: &str) -> Result<()> {
    if session_id.is_empty() {
      return Ok(());
    }
    self.kv.del(&session_key(session_id)).await
  }
}
