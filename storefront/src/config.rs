// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

/// Credentials for the hosted services. Absent in mock mode.
#[derive(Debug, Clone)]
pub struct ServiceCredentials {
  pub stripe_secret_key: String,
  pub stripe_api_base: String,
  pub resend_api_key: String,
  pub kv_rest_url: String,
  pub kv_rest_token: String,
  pub blob_token: String,
  pub blob_api_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub site_url: String,

  pub admin_token: String,
  pub admin_uk_only: bool,
  pub admin_cookie_secure: bool,

  pub stripe_webhook_secret: String,
  pub order_from_email: String,
  /// Empty disables the admin copy of order emails.
  pub admin_to_email: String,

  /// `None` runs every hosted service in memory.
  pub services: Option<ServiceCredentials>,

  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let require = |name: &str| get(name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)));
    let flag = |name: &str, default: bool| -> Result<bool> {
      match get(name).as_deref() {
        None => Ok(default),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("FALSE") | Some("no") => Ok(false),
        Some(other) => Err(AppError::Config(format!("Invalid boolean for '{}': {}", name, other))),
      }
    };

    let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = get("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let site_url = get("SITE_URL")
      .unwrap_or_else(|| "http://localhost:3000".to_string())
      .trim_end_matches('/')
      .to_string();

    let admin_token = require("ADMIN_TOKEN")?;
    let admin_uk_only = flag("ADMIN_UK_ONLY", false)?;
    let admin_cookie_secure = flag("ADMIN_COOKIE_SECURE", true)?;

    let use_mock = flag("USE_MOCK_SERVICES", false)?;

    let (services, stripe_webhook_secret) = if use_mock {
      let secret = get("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|| "whsec_mock".to_string());
      (None, secret)
    } else {
      let kv_rest_url = get("UPSTASH_REDIS_REST_URL")
        .or_else(|| get("KV_REST_API_URL"))
        .ok_or_else(|| AppError::Config("Missing Upstash env vars (UPSTASH_REDIS_REST_URL / KV_REST_API_URL)".to_string()))?;
      let kv_rest_token = get("UPSTASH_REDIS_REST_TOKEN")
        .or_else(|| get("KV_REST_API_TOKEN"))
        .ok_or_else(|| AppError::Config("Missing Upstash env vars (UPSTASH_REDIS_REST_TOKEN / KV_REST_API_TOKEN)".to_string()))?;
      let creds = ServiceCredentials {
        stripe_secret_key: require("STRIPE_SECRET_KEY")?,
        stripe_api_base: get("STRIPE_API_BASE")
          .unwrap_or_else(|| "https://api.stripe.com".to_string())
          .trim_end_matches('/')
          .to_string(),
        resend_api_key: require("RESEND_API_KEY")?,
        kv_rest_url: kv_rest_url.trim_end_matches('/').to_string(),
        kv_rest_token,
        blob_token: require("BLOB_READ_WRITE_TOKEN")?,
        blob_api_url: get("BLOB_API_URL")
          .unwrap_or_else(|| "https://blob.vercel-storage.com".to_string())
          .trim_end_matches('/')
          .to_string(),
      };
      (Some(creds), require("STRIPE_WEBHOOK_SECRET")?)
    };

    let order_from_email =
      get("ORDER_FROM_EMAIL").unwrap_or_else(|| "Generations in Making <onboarding@resend.dev>".to_string());
    let admin_to_email = get("ADMIN_TO_EMAIL").unwrap_or_default();

    let log_format = match get("LOG_FORMAT").as_deref() {
      None | Some("text") => LogFormat::Text,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT: {}", other))),
    };

    Ok(Self {
      server_host,
      server_port,
      site_url,
      admin_token,
      admin_uk_only,
      admin_cookie_secure,
      stripe_webhook_secret,
      order_from_email,
      admin_to_email,
      services,
      log_format,
    })
  }

  pub fn uses_mock_services(&self) -> bool {
    self.services.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| map.get(name).cloned()
  }

  #[test]
  fn mock_mode_needs_only_admin_token() {
    let cfg = AppConfig::from_lookup(lookup(&[("ADMIN_TOKEN", "letmein"), ("USE_MOCK_SERVICES", "1")])).unwrap();
    assert!(cfg.uses_mock_services());
    assert_eq!(cfg.server_port, 8080);
    assert_eq!(cfg.site_url, "http://localhost:3000");
    assert_eq!(cfg.stripe_webhook_secret, "whsec_mock");
    assert!(!cfg.admin_uk_only);
    assert!(cfg.admin_cookie_secure);
    assert!(cfg.admin_to_email.is_empty());
  }

  #[test]
  fn missing_admin_token_is_a_config_error() {
    let err = AppConfig::from_lookup(lookup(&[("USE_MOCK_SERVICES", "1")])).unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("ADMIN_TOKEN")));
  }

  #[test]
  fn live_mode_accepts_vercel_kv_aliases() {
    let cfg = AppConfig::from_lookup(lookup(&[
      ("ADMIN_TOKEN", "t"),
      ("STRIPE_SECRET_KEY", "sk_test"),
      ("STRIPE_WEBHOOK_SECRET", "whsec_live"),
      ("RESEND_API_KEY", "re_123"),
      ("KV_REST_API_URL", "https://kv.example.io/"),
      ("KV_REST_API_TOKEN", "kvtoken"),
      ("BLOB_READ_WRITE_TOKEN", "blob"),
      ("SITE_URL", "https://shop.example/"),
      ("ADMIN_UK_ONLY", "1"),
    ]))
    .unwrap();
    let services = cfg.services.as_ref().unwrap();
    assert_eq!(services.kv_rest_url, "https://kv.example.io");
    assert_eq!(services.stripe_api_base, "https://api.stripe.com");
    assert_eq!(cfg.site_url, "https://shop.example");
    assert!(cfg.admin_uk_only);
  }

  #[test]
  fn live_mode_without_stripe_key_fails() {
    let err = AppConfig::from_lookup(lookup(&[("ADMIN_TOKEN", "t")])).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
  }

  #[test]
  fn rejects_bad_port() {
    let err =
      AppConfig::from_lookup(lookup(&[("ADMIN_TOKEN", "t"), ("USE_MOCK_SERVICES", "1"), ("SERVER_PORT", "http")]))
        .unwrap_err();
    assert!(matches!(err, AppError::Config(ref m) if m.contains("SERVER_PORT")));
  }
}
