// storefront/src/services/kv.rs

//! Key-value store access: plain string keys plus one sorted-set index.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::errors::{AppError, Result};

#[async_trait]
pub trait KvStore: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<String>>;

  /// Stores `value`, expiring after `ttl` when given.
  async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

  async fn del(&self, key: &str) -> Result<()>;

  async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()>;

  /// Members by descending score, `start..=stop` inclusive.
  async fn zrevrange(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>>;
}

/// Upstash Redis over its REST API (one JSON command array per request).
pub struct UpstashKv {
  client: reqwest::Client,
  base_url: String,
  token: String,
}

impl UpstashKv {
  pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
    Self {
      client,
      base_url: base_url.into(),
      token: token.into(),
    }
  }

  async fn command(&self, args: Value) -> Result<Value> {
    let resp = self
      .client
      .post(&self.base_url)
      .bearer_auth(&self.token)
      .json(&args)
      .send()
      .await
      .map_err(|e| AppError::Store(format!("Redis request failed: {}", e)))?;

    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or_else(|_| json!({}));
    if let Some(err) = body.get("error").and_then(Value::as_str) {
      return Err(AppError::Store(err.to_string()));
    }
    if !status.is_success() {
      return Err(AppError::Store(format!("Redis request failed: {}", status.as_u16())));
    }
    Ok(body.get("result").cloned().unwrap_or(Value::Null))
  }
}

#[async_trait]
impl KvStore for UpstashKv {
  #[instrument(name = "kv::get", skip(self))]
  async fn get(&self, key: &str) -> Result<Option<String>> {
    let result = self.command(json!(["GET", key])).await?;
    Ok(result.as_str().map(str::to_string))
  }

  #[instrument(name = "kv::set", skip(self, value), fields(value_len = value.len()))]
  async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
    let cmd = match ttl {
      Some(ttl) => json!(["SET", key, value, "EX", ttl.as_secs()]),
      None => json!(["SET", key, value]),
    };
    self.command(cmd).await.map(|_| ())
  }

  #[instrument(name = "kv::del", skip(self))]
  async fn del(&self, key: &str) -> Result<()> {
    self.command(json!(["DEL", key])).await.map(|_| ())
  }

  #[instrument(name = "kv::zadd", skip(self))]
  async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()> {
    self.command(json!(["ZADD", key, score, member])).await.map(|_| ())
  }

  #[instrument(name = "kv::zrevrange", skip(self))]
  async fn zrevrange(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>> {
    let result = self.command(json!(["ZRANGE", key, start, stop, "REV"])).await?;
    let members = result
      .as_array()
      .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
      .unwrap_or_default();
    Ok(members)
  }
}

#[derive(Default)]
struct MemoryInner {
  strings: HashMap<String, (String, Option<Instant>)>,
  sorted_sets: HashMap<String, HashMap<String, i64>>,
}

/// Process-local store used in mock mode and tests.
#[derive(Default)]
pub struct MemoryKv {
  inner: Mutex<MemoryInner>,
}

impl MemoryKv {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KvStore for MemoryKv {
  async fn get(&self, key: &str) -> Result<Option<String>> {
    let mut inner = self.inner.lock();
    let expired = matches!(inner.strings.get(key), Some((_, Some(deadline))) if *deadline <= Instant::now());
    if expired {
      debug!(key, "Expired key evicted.");
      inner.strings.remove(key);
      return Ok(None);
    }
    Ok(inner.strings.get(key).map(|(v, _)| v.clone()))
  }

  async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
    let deadline = ttl.map(|t| Instant::now() + t);
    self.inner.lock().strings.insert(key.to_string(), (value.to_string(), deadline));
    Ok(())
  }

  async fn del(&self, key: &str) -> Result<()> {
    self.inner.lock().strings.remove(key);
    Ok(())
  }

  async fn zadd(&self, key: &str, score: i64, member: &str) -> Result<()> {
    self
      .inner
      .lock()
      .sorted_sets
      .entry(key.to_string())
      .or_default()
      .insert(member.to_string(), score);
    Ok(())
  }

  async fn zrevrange(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>> {
    let inner = self.inner.lock();
    let Some(set) = inner.sorted_sets.get(key) else {
      return Ok(Vec::new());
    };
    let mut members: Vec<(&String, &i64)> = set.iter().collect();
    // Redis orders equal scores lexicographically; reversed here.
    members.sort_by(|a, b| b.1.cmp(a.1).then_with(|| b.0.cmp(a.0)));
    Ok(
      members
        .into_iter()
        .skip(start)
        .take(stop.saturating_sub(start) + 1)
        .map(|(m, _)| m.clone())
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn memory_kv_round_trips_and_deletes() {
    let kv = MemoryKv::new();
    kv.set("order:GIM-1", "{}", None).await.unwrap();
    assert_eq!(kv.get("order:GIM-1").await.unwrap().as_deref(), Some("{}"));
    kv.del("order:GIM-1").await.unwrap();
    assert!(kv.get("order:GIM-1").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn memory_kv_expires_keys() {
    let kv = MemoryKv::new();
    kv.set("admin:session:x", "1", Some(Duration::from_millis(0))).await.unwrap();
    assert!(kv.get("admin:session:x").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn zrevrange_is_newest_first_and_inclusive() {
    let kv = MemoryKv::new();
    kv.zadd("orders", 10, "a").await.unwrap();
    kv.zadd("orders", 30, "c").await.unwrap();
    kv.zadd("orders", 20, "b").await.unwrap();
    assert_eq!(kv.zrevrange("orders", 0, 1).await.unwrap(), vec!["c", "b"]);
    assert_eq!(kv.zrevrange("orders", 0, 199).await.unwrap(), vec!["c", "b", "a"]);
    assert_eq!(kv.zrevrange("orders", 2, 5).await.unwrap(), vec!["a"]);
    assert!(kv.zrevrange("missing", 0, 10).await.unwrap().is_empty());
  }
}
