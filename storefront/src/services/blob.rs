// storefront/src/services/blob.rs

//! Public blob storage for customer photo uploads.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};

const UPLOAD_PREFIX: &str = "uploads";
const FALLBACK_NAME: &str = "upload";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
  pub url: String,
  pub pathname: String,
  pub content_type: String,
  pub size: usize,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
  /// Stores `body` publicly at `pathname`.
  async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<StoredBlob>;
}

/// Lowercase, `[a-z0-9._-]` only, single dashes, no dashes at either end.
pub fn safe_name(original: &str) -> String {
  let mut out = String::with_capacity(original.len());
  for c in original.to_lowercase().chars() {
    let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-') {
      c
    } else {
      '-'
    };
    if c == '-' && out.ends_with('-') {
      continue;
    }
    out.push(c);
  }
  let trimmed = out.trim_matches('-');
  if trimmed.is_empty() {
    FALLBACK_NAME.to_string()
  } else {
    trimmed.to_string()
  }
}

/// `uploads/{millis}-{uuid}-{safe name}`.
pub fn upload_pathname(original: &str, millis: i64, id: uuid::Uuid) -> String {
  format!("{}/{}-{}-{}", UPLOAD_PREFIX, millis, id, safe_name(original))
}

/// Vercel Blob over its REST API.
pub struct VercelBlob {
  client: reqwest::Client,
  api_url: String,
  token: String,
}

impl VercelBlob {
  pub fn new(client: reqwest::Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
    Self {
      client,
      api_url: api_url.into(),
      token: token.into(),
    }
  }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PutResponse {
  url: String,
  pathname: String,
  content_type: Option<String>,
}

#[async_trait]
impl BlobStore for VercelBlob {
  #[instrument(name = "blob::put", skip(self, body), fields(size = body.len()))]
  async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<StoredBlob> {
    let size = body.len();
    let resp = self
      .client
      .put(format!("{}/{}", self.api_url, pathname))
      .bearer_auth(&self.token)
      .header("x-api-version", "7")
      .header("x-content-type", content_type)
      .header("x-add-random-suffix", "0")
      .body(body)
      .send()
      .await
      .map_err(|e| AppError::Blob(format!("Upload request failed: {}", e)))?;

    let status = resp.status();
    if !status.is_success() {
      let text = resp.text().await.unwrap_or_default();
      return Err(AppError::Blob(format!("Upload rejected ({}): {}", status, text)));
    }
    let stored: PutResponse = resp
      .json()
      .await
      .map_err(|e| AppError::Blob(format!("Unexpected upload response: {}", e)))?;
    info!(url = %stored.url, "Blob stored.");
    Ok(StoredBlob {
      url: stored.url,
      pathname: stored.pathname,
      content_type: stored.content_type.unwrap_or_else(|| content_type.to_string()),
      size,
    })
  }
}

/// In-memory blob store serving URLs under a fixed base.
pub struct MemoryBlob {
  base_url: String,
  objects: Mutex<HashMap<String, (String, Bytes)>>,
}

impl MemoryBlob {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      objects: Mutex::new(HashMap::new()),
    }
  }

  /// Content type and body stored at `pathname`.
  pub fn object(&self, pathname: &str) -> Option<(String, Bytes)> {
    self.objects.lock().get(pathname).cloned()
  }
}

#[async_trait]
impl BlobStore for MemoryBlob {
  async fn put(&self, pathname: &str, body: Bytes, content_type: &str) -> Result<StoredBlob> {
    let size = body.len();
    self
      .objects
      .lock()
      .insert(pathname.to_string(), (content_type.to_string(), body));
    Ok(StoredBlob {
      url: format!("{}/{}", self.base_url, pathname),
      pathname: pathname.to_string(),
      content_type: content_type.to_string(),
      size,
    })
  }
}
