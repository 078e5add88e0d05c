// storefront/src/pipelines/contexts.rs

//! Data carried through each pipeline. Handlers receive these wrapped in
//! `conveyor::ContextData`.

use actix_web::web::Bytes;
use serde::Deserialize;

use crate::models::{Cart, Order, OrderStatus, ShippingZone};
use crate::services::payments::{CheckoutSession, CreatedSession, WebhookEvent};
use crate::state::AppState;

// --- Checkout ---

/// A cart line as the browser sends it. Prices and quantities are informational only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
  pub id: String,
  #[serde(default)]
  pub option_id: Option<String>,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub qty: Option<serde_json::Value>,
  #[serde(default)]
  pub unit_price: Option<serde_json::Value>,
  #[serde(default)]
  pub upload_url: Option<String>,
  #[serde(default)]
  pub custom_text: Option<String>,
  #[serde(default)]
  pub font: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub items: Vec<CartLineInput>,
  pub shipping_zone: ShippingZone,
  // Filled in by the pipeline:
  pub cart: Cart,
  pub subtotal_pence: i64,
  pub shipping_pence: i64,
  pub session: Option<CreatedSession>,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, items: Vec<CartLineInput>, shipping_zone: ShippingZone) -> Self {
    Self {
      app_state,
      items,
      shipping_zone,
      cart: Cart::new(),
      subtotal_pence: 0,
      shipping_pence: 0,
      session: None,
    }
  }
}

// --- Payment webhook ---

/// How a webhook delivery was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
  Pending,
  /// Event type the store does not act on.
  Ignored(String),
  /// An order already exists for the session and was confirmed.
  Duplicate(String),
  /// An order already exists for the session but its confirmation never went out.
  Resumed(String),
  Created(String),
}

#[derive(Clone)]
pub struct PaymentWebhookCtxData {
  pub app_state: AppState,
  pub raw_body: Bytes,
  pub signature_header: Option<String>,
  pub event: Option<WebhookEvent>,
  pub session_id: Option<String>,
  pub session: Option<CheckoutSession>,
  pub order: Option<Order>,
  pub outcome: WebhookOutcome,
}

impl PaymentWebhookCtxData {
  pub fn new(app_state: AppState, raw_body: Bytes, signature_header: Option<String>) -> Self {
    Self {
      app_state,
      raw_body,
      signature_header,
      event: None,
      session_id: None,
      session: None,
      order: None,
      outcome: WebhookOutcome::Pending,
    }
  }
}

// --- Admin status update ---

#[derive(Clone)]
pub struct OrderStatusCtxData {
  pub app_state: AppState,
  pub order_id: String,
  pub requested_status: String,
  pub tracking_number: Option<String>,
  pub status: Option<OrderStatus>,
  pub order: Option<Order>,
  pub shipped_email_sent: bool,
}

impl OrderStatusCtxData {
  pub fn new(app_state: AppState, order_id: String, requested_status: String, tracking_number: Option<String>) -> Self {
    Self {
      app_state,
      order_id,
      requested_status,
      tracking_number,
      status: None,
      order: None,
      shipped_email_sent: false,
    }
  }
}
