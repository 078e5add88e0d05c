// storefront/src/services/order_store.rs

//! Orders persisted as JSON documents, indexed by creation time.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::models::{Order, OrderStatus};
use crate::services::kv::KvStore;

const ORDERS_INDEX: &str = "orders";
pub const DEFAULT_LIST_LIMIT: usize = 200;

fn order_key(id: &str) -> String {
  format!("order:{}", id)
}

fn session_key(session_id: &str) -> String {
  format!("order:session:{}", session_id)
}

fn confirmed_key(session_id: &str) -> String {
  format!("order:confirmed:{}", session_id)
}

#[derive(Clone)]
pub struct OrderStore {
  kv: Arc<dyn KvStore>,
}

impl OrderStore {
  pub fn new(kv: Arc<dyn KvStore>) -> Self {
    Self { kv }
  }

  #[instrument(name = "order_store::save", skip(self, order), fields(order_id = %order.id))]
  pub async fn save(&self, order: &Order) -> Result<()> {
    let json = serde_json::to_string(order).map_err(|e| AppError::Internal(format!("Order encoding failed: {}", e)))?;
    self.kv.set(&order_key(&order.id), &json, None).await?;
    self
      .kv
      .zadd(ORDERS_INDEX, order.created_at.timestamp_millis(), &order.id)
      .await?;
    if !order.payment_session_id.is_empty() {
      self
        .kv
        .set(&session_key(&order.payment_session_id), &order.id, None)
        .await?;
    }
    info!("Order saved.");
    Ok(())
  }

  /// Records that the confirmation emails for a session's order went out.
  #[instrument(name = "order_store::mark_confirmed", skip(self))]
  pub async fn mark_confirmed(&self, session_id: &str) -> Result<()> {
    self.kv.set(&confirmed_key(session_id), "1", None).await
  }

  #[instrument(name = "order_store::is_confirmed", skip(self))]
  pub async fn is_confirmed(&self, session_id: &str) -> Result<bool> {
    Ok(self.kv.get(&confirmed_key(session_id)).await?.is_some())
  }

  /// Missing and undecodable records both read as `None`.
  #[instrument(name = "order_store::get", skip(self))]
  pub async fn get(&self, id: &str) -> Result<Option<Order>> {
    let Some(raw) = self.kv.get(&order_key(id)).await? else {
      return Ok(None);
    };
    match serde_json::from_str::<Order>(&raw) {
      Ok(order) => Ok(Some(order)),
      Err(e) => {
        warn!(error = %e, "Stored order could not be decoded.");
        Ok(None)
      }
    }
  }

  /// The order created for a payment session, if one exists.
  #[instrument(name = "order_store::find_by_session", skip(self))]
  pub async fn find_by_session(&self, session_id: &str) -> Result<Option<Order>> {
    match self.kv.get(&session_key(session_id)).await? {
      Some(order_id) => self.get(&order_id).await,
      None => Ok(None),
    }
  }

  /// Newest first, at most `limit` orders.
  #[instrument(name = "order_store::list", skip(self))]
  pub async fn list(&self, limit: usize) -> Result<Vec<Order>> {
    if limit == 0 {
      return Ok(Vec::new());
    }
    let ids = self.kv.zrevrange(ORDERS_INDEX, 0, limit - 1).await?;
    let mut orders = Vec::with_capacity(ids.len());
    for id in ids {
      if let Some(order) = self.get(&id).await? {
        orders.push(order);
      }
    }
    Ok(orders)
  }

  /// Sets the status and, when given, the tracking number. `None` if the order does not exist.
  #[instrument(name = "order_store::update_status", skip(self))]
  pub async fn update_status(
    &self,
    id: &str,
    status: OrderStatus,
    tracking_number: Option<String>,
  ) -> Result<Option<Order>> {
    let Some(mut order) = self.get(id).await? else {
      return Ok(None);
    };
    order.status = status;
    if tracking_number.is_some() {
      order.tracking_number = tracking_number;
    }
    let json = serde_json::to_string(&order).map_err(|e| AppError::Internal(format!("Order encoding failed: {}", e)))?;
    self.kv.set(&order_key(id), &json, None).await?;
    info!(status = %order.status, "Order status updated.");
    Ok(Some(order))
  }
}
