// storefront/src/pipelines/webhook_pipeline.rs

//! Ingests payment webhooks: a completed checkout session becomes a paid order.

use chrono::{DateTime, Utc};
use conveyor::{Conveyor, ContextData, Pipeline, PipelineControl, SkipCondition};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::order::UNKNOWN_EMAIL;
use crate::models::{Order, OrderItem, OrderStatus, ShippingAddress};
use crate::pipelines::contexts::{PaymentWebhookCtxData, WebhookOutcome};
use crate::services::email::OrderEmailKind;
use crate::services::payments::{Address, CheckoutSession, LineItem, WebhookEvent, CHECKOUT_COMPLETED};
use crate::services::webhook_signature::{self, DEFAULT_TOLERANCE_SECS};
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "gbp";
const FALLBACK_ITEM_NAME: &str = "Item";

fn text(value: Option<&String>) -> Option<String> {
  value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn first_text(candidates: &[Option<&String>]) -> Option<String> {
  candidates.iter().find_map(|c| text(*c))
}

fn metadata_value(item: &LineItem, keys: &[&str]) -> Option<String> {
  let metadata = &item.product()?.metadata;
  first_text(&keys.iter().map(|k| metadata.get(*k)).collect::<Vec<_>>())
}

fn order_item(item: &LineItem) -> OrderItem {
  let quantity = item.quantity.unwrap_or(1);
  let divisor = i64::from(quantity.max(1));
  let unit_price_pence = item
    .price
    .as_ref()
    .and_then(|p| p.unit_amount)
    .or_else(|| item.amount_subtotal.map(|s| (s as f64 / divisor as f64).round() as i64))
    .unwrap_or(0);
  let line_total_pence = item
    .amount_subtotal
    .unwrap_or(unit_price_pence * i64::from(quantity));
  let name = first_text(&[item.product().and_then(|p| p.name.as_ref()), item.description.as_ref()])
    .unwrap_or_else(|| FALLBACK_ITEM_NAME.to_string());

  OrderItem {
    name,
    quantity,
    unit_price_pence,
    line_total_pence,
    upload_url: metadata_value(item, &["upload_url", "uploadUrl"]),
    custom_text: metadata_value(item, &["custom_text", "customText"]),
    font: metadata_value(item, &["font"]),
  }
}

fn shipping_address(session: &CheckoutSession) -> Option<ShippingAddress> {
  let shipping = session.shipping();
  let customer = session.customer_details.as_ref();
  let address: Option<&Address> = shipping
    .and_then(|s| s.address.as_ref())
    .or_else(|| customer.and_then(|c| c.address.as_ref()));

  let result = ShippingAddress {
    name: first_text(&[shipping.and_then(|s| s.name.as_ref()), customer.and_then(|c| c.name.as_ref())]),
    phone: first_text(&[shipping.and_then(|s| s.phone.as_ref()), customer.and_then(|c| c.phone.as_ref())]),
    line1: text(address.and_then(|a| a.line1.as_ref())),
    line2: text(address.and_then(|a| a.line2.as_ref())),
    city: text(address.and_then(|a| a.city.as_ref())),
    state: text(address.and_then(|a| a.state.as_ref())),
    postal_code: text(address.and_then(|a| a.postal_code.as_ref())),
    country: text(address.and_then(|a| a.country.as_ref())),
  };
  (result != ShippingAddress::default()).then_some(result)
}

/// Normalises a retrieved checkout session into a new paid order.
pub fn order_from_session(session: &CheckoutSession, created_at: DateTime<Utc>) -> Order {
  let customer_email = first_text(&[
    session.customer_details.as_ref().and_then(|c| c.email.as_ref()),
    session.customer_email.as_ref(),
  ])
  .unwrap_or_else(|| UNKNOWN_EMAIL.to_string());

  Order {
    id: Order::generate_id(),
    created_at,
    status: OrderStatus::Paid,
    currency: text(session.currency.as_ref())
      .map(|c| c.to_ascii_lowercase())
      .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    customer_email,
    shipping_address: shipping_address(session),
    items: session.line_items().iter().map(order_item).collect(),
    subtotal_pence: session.amount_subtotal.unwrap_or(0),
    shipping_pence: session
      .total_details
      .as_ref()
      .and_then(|t| t.amount_shipping)
      .unwrap_or(0),
    total_pence: session.amount_total.unwrap_or(0),
    payment_session_id: session.id.clone(),
    tracking_number: None,
  }
}

async fn verify_signature(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let guard = ctx_data.read();
  let header = guard
    .signature_header
    .as_deref()
    .ok_or_else(|| AppError::Validation("Missing stripe-signature header".to_string()))?;
  webhook_signature::verify(
    &guard.raw_body,
    header,
    &guard.app_state.config.stripe_webhook_secret,
    DEFAULT_TOLERANCE_SECS,
    Utc::now().timestamp(),
  )?;
  Ok(PipelineControl::Continue)
}

async fn parse_event(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let event: WebhookEvent = {
    let guard = ctx_data.read();
    serde_json::from_slice(&guard.raw_body).map_err(|e| AppError::Validation(format!("Invalid event payload: {}", e)))?
  };
  info!(event_id = %event.id, event_type = %event.event_type, "Webhook event received.");
  ctx_data.write().event = Some(event);
  Ok(PipelineControl::Continue)
}

async fn check_event_type(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let (event_type, session_id) = match guard.event.as_ref() {
    Some(event) => (event.event_type.clone(), event.object_id().map(str::to_string)),
    None => return Err(AppError::Internal("Webhook event missing after parsing".to_string())),
  };
  if event_type != CHECKOUT_COMPLETED {
    info!(%event_type, "Ignoring webhook event type.");
    guard.outcome = WebhookOutcome::Ignored(event_type);
    return Ok(PipelineControl::Stop);
  }
  let session_id = session_id.ok_or_else(|| AppError::Validation("Checkout session id missing from event".to_string()))?;
  guard.session_id = Some(session_id);
  Ok(PipelineControl::Continue)
}

async fn skip_duplicate(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let (orders, session_id) = {
    let guard = ctx_data.read();
    (guard.app_state.orders.clone(), guard.session_id.clone().unwrap_or_default())
  };
  let Some(existing) = orders.find_by_session(&session_id).await? else {
    return Ok(PipelineControl::Continue);
  };
  if orders.is_confirmed(&session_id).await? {
    warn!(order_id = %existing.id, %session_id, "Order already recorded for this session.");
    ctx_data.write().outcome = WebhookOutcome::Duplicate(existing.id);
    return Ok(PipelineControl::Stop);
  }

  info!(order_id = %existing.id, %session_id, "Order recorded without confirmation, resending.");
  let mut guard = ctx_data.write();
  guard.outcome = WebhookOutcome::Resumed(existing.id.clone());
  guard.order = Some(existing);
  Ok(PipelineControl::Continue)
}

async fn fetch_session(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let (payments, session_id) = {
    let guard = ctx_data.read();
    (guard.app_state.payments.clone(), guard.session_id.clone().unwrap_or_default())
  };
  let session = payments.retrieve_checkout_session(&session_id).await?;
  info!(%session_id, lines = session.line_items().len(), "Checkout session retrieved.");
  ctx_data.write().session = Some(session);
  Ok(PipelineControl::Continue)
}

async fn build_order(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  let session = guard
    .session
    .as_ref()
    .ok_or_else(|| AppError::Internal("Checkout session missing before order build".to_string()))?;
  let order = order_from_session(session, Utc::now());
  if !order.totals_balance() {
    warn!(order_id = %order.id, "Order totals do not add up.");
  }
  guard.order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn persist_order(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let (orders, order) = {
    let guard = ctx_data.read();
    let order = guard
      .order
      .clone()
      .ok_or_else(|| AppError::Internal("Order missing before persist".to_string()))?;
    (guard.app_state.orders.clone(), order)
  };
  orders.save(&order).await?;
  ctx_data.write().outcome = WebhookOutcome::Created(order.id);
  Ok(PipelineControl::Continue)
}

async fn send_confirmation(ctx_data: ContextData<PaymentWebhookCtxData>) -> Result<PipelineControl, AppError> {
  let (notifier, orders, order) = {
    let guard = ctx_data.read();
    (guard.app_state.notifier.clone(), guard.app_state.orders.clone(), guard.order.clone())
  };
  let Some(order) = order else {
    return Err(AppError::Internal("Order missing before confirmation".to_string()));
  };
  notifier
    .send_order_emails(&order, OrderEmailKind::NewOrder)
    .await
    .map_err(|e| {
      error!(order_id = %order.id, error = %e, "Order confirmation email failed.");
      e
    })?;
  orders.mark_confirmed(&order.payment_session_id).await?;
  Ok(PipelineControl::Continue)
}

pub fn register_payment_webhook_pipeline(registry: &Arc<Conveyor<AppError>>, _app_state: &AppState) {
  let already_stored: SkipCondition<PaymentWebhookCtxData> = Arc::new(|ctx_data: ContextData<PaymentWebhookCtxData>| {
    matches!(ctx_data.read().outcome, WebhookOutcome::Resumed(_))
  });

  let mut p = Pipeline::<PaymentWebhookCtxData, AppError>::new(&[
    ("verify_signature", false, None),
    ("parse_event", false, None),
    ("check_event_type", false, None),
    ("skip_duplicate", false, None),
    ("fetch_session", false, Some(already_stored.clone())),
    ("build_order", false, Some(already_stored.clone())),
    ("persist_order", false, Some(already_stored)),
    ("send_confirmation", false, None),
  ]);

  p.on_root("verify_signature", verify_signature);
  p.on_root("parse_event", parse_event);
  p.on_root("check_event_type", check_event_type);
  p.on_root("skip_duplicate", skip_duplicate);
  p.on_root("fetch_session", fetch_session);
  p.on_root("build_order", build_order);
  p.on_root("persist_order", persist_order);
  p.on_root("send_confirmation", send_confirmation);

  p.after_root("persist_order", |ctx_data: ContextData<PaymentWebhookCtxData>| {
    Box::pin(async move {
      if let WebhookOutcome::Created(order_id) = &ctx_data.read().outcome {
        info!(%order_id, "Paid order recorded.");
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  info!("Payment webhook pipeline registered.");
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn session(value: serde_json::Value) -> CheckoutSession {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn normalises_a_full_session() {
    let s = session(json!({
      "id": "cs_test_1",
      "currency": "GBP",
      "customer_details": { "email": "buyer@example.com", "name": "Billing Name", "phone": "+44 1" },
      "shipping_details": { "name": "Ship Name", "address": { "line1": "1 High St", "line2": "", "city": "Leeds", "postal_code": "LS1 1AA", "country": "GB" } },
      "amount_subtotal": 2550,
      "amount_total": 2770,
      "total_details": { "amount_shipping": 220 },
      "line_items": { "data": [
        { "description": "desc", "quantity": 1, "amount_subtotal": 550,
          "price": { "unit_amount": 550, "product": { "id": "prod_1", "name": "Metal Wallet Photo Card",
            "metadata": { "upload_url": "https://blob.example/a.jpg", "customText": "Nan", "font": "Script" } } } },
        { "quantity": 2, "amount_subtotal": 2001, "price": { "product": "prod_2" }, "description": "Loose item" }
      ] }
    }));

    let now = Utc::now();
    let order = order_from_session(&s, now);
    assert!(order.id.starts_with("GIM-"));
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.currency, "gbp");
    assert_eq!(order.customer_email, "buyer@example.com");
    assert_eq!(order.created_at, now);
    assert_eq!((order.subtotal_pence, order.shipping_pence, order.total_pence), (2550, 220, 2770));
    assert!(order.totals_balance());

    let address = order.shipping_address.unwrap();
    assert_eq!(address.name.as_deref(), Some("Ship Name"));
    assert_eq!(address.phone.as_deref(), Some("+44 1"));
    assert_eq!(address.line2, None);
    assert_eq!(address.lines(), vec!["Ship Name", "1 High St", "Leeds", "LS1 1AA", "GB"]);

    let first = &order.items[0];
    assert_eq!(first.name, "Metal Wallet Photo Card");
    assert_eq!(first.upload_url.as_deref(), Some("https://blob.example/a.jpg"));
    assert_eq!(first.custom_text.as_deref(), Some("Nan"));
    assert_eq!(first.font.as_deref(), Some("Script"));

    let second = &order.items[1];
    assert_eq!(second.name, "Loose item");
    assert_eq!(second.unit_price_pence, 1001);
    assert_eq!(second.line_total_pence, 2001);
    assert_eq!(second.quantity, 2);
  }

  #[test]
  fn sparse_session_falls_back() {
    let s = session(json!({
      "id": "cs_test_2",
      "customer_email": "fallback@example.com",
      "customer_details": { "address": { "city": "Dublin", "country": "IE" } },
      "line_items": { "data": [ { "price": { "unit_amount": 400 } } ] }
    }));
    let order = order_from_session(&s, Utc::now());
    assert_eq!(order.customer_email, "fallback@example.com");
    assert_eq!(order.currency, "gbp");
    assert_eq!(order.shipping_address.unwrap().city.as_deref(), Some("Dublin"));
    let item = &order.items[0];
    assert_eq!(item.name, "Item");
    assert_eq!(item.quantity, 1);
    assert_eq!(item.line_total_pence, 400);
    assert_eq!(order.total_pence, 0);
  }

  #[test]
  fn missing_email_and_address() {
    let order = order_from_session(&session(json!({ "id": "cs_test_3" })), Utc::now());
    assert_eq!(order.customer_email, "unknown");
    assert!(order.shipping_address.is_none());
    assert!(order.items.is_empty());
  }
}
