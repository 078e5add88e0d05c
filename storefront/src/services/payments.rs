// storefront/src/services/payments.rs

//! Hosted checkout sessions: the request we send, the session the provider
//! returns on retrieval, and the webhook event envelope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::Result;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutLine {
  pub name: String,
  pub description: Option<String>,
  pub unit_amount_pence: i64,
  pub quantity: u32,
  /// Attached to the line's product so it comes back with the completed session.
  pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingRate {
  pub display_name: String,
  pub amount_pence: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSessionRequest {
  pub currency: String,
  pub success_url: String,
  pub cancel_url: String,
  pub allowed_countries: Vec<String>,
  pub collect_phone: bool,
  pub lines: Vec<CheckoutLine>,
  pub shipping: Option<ShippingRate>,
  pub metadata: BTreeMap<String, String>,
}

impl CheckoutSessionRequest {
  /// Form-encoded parameters in the provider's bracket notation.
  pub fn to_form_params(&self) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
      ("mode".into(), "payment".into()),
      ("success_url".into(), self.success_url.clone()),
      ("cancel_url".into(), self.cancel_url.clone()),
    ];
    for (i, country) in self.allowed_countries.iter().enumerate() {
      params.push((format!("shipping_address_collection[allowed_countries][{}]", i), country.clone()));
    }
    if self.collect_phone {
      params.push(("phone_number_collection[enabled]".into(), "true".into()));
    }
    for (i, line) in self.lines.iter().enumerate() {
      let prefix = format!("line_items[{}]", i);
      params.push((format!("{}[quantity]", prefix), line.quantity.to_string()));
      params.push((format!("{}[price_data][currency]", prefix), self.currency.clone()));
      params.push((format!("{}[price_data][unit_amount]", prefix), line.unit_amount_pence.to_string()));
      params.push((format!("{}[price_data][product_data][name]", prefix), line.name.clone()));
      if let Some(description) = line.description.as_ref().filter(|d| !d.is_empty()) {
        params.push((format!("{}[price_data][product_data][description]", prefix), description.clone()));
      }
      for (key, value) in &line.metadata {
        params.push((format!("{}[price_data][product_data][metadata][{}]", prefix, key), value.clone()));
      }
    }
    if let Some(rate) = &self.shipping {
      let prefix = "shipping_options[0][shipping_rate_data]";
      params.push((format!("{}[type]", prefix), "fixed_amount".into()));
      params.push((format!("{}[display_name]", prefix), rate.display_name.clone()));
      params.push((format!("{}[fixed_amount][amount]", prefix), rate.amount_pence.to_string()));
      params.push((format!("{}[fixed_amount][currency]", prefix), self.currency.clone()));
    }
    for (key, value) in &self.metadata {
      params.push((format!("metadata[{}]", key), value.clone()));
    }
    params
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSession {
  pub id: String,
  pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub line1: Option<String>,
  pub line2: Option<String>,
  pub city: Option<String>,
  pub state: Option<String>,
  pub postal_code: Option<String>,
  pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
  pub email: Option<String>,
  pub name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
  pub name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedInformation {
  pub shipping_details: Option<ShippingDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalDetails {
  pub amount_shipping: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductObject {
  pub id: String,
  pub name: Option<String>,
  pub description: Option<String>,
  #[serde(default)]
  pub metadata: BTreeMap<String, String>,
}

/// A reference that is either an id or the expanded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
  Id(String),
  Object(T),
}

impl<T> Expandable<T> {
  pub fn as_object(&self) -> Option<&T> {
    match self {
      Expandable::Object(obj) => Some(obj),
      Expandable::Id(_) => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
  pub unit_amount: Option<i64>,
  pub product: Option<Expandable<ProductObject>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
  pub description: Option<String>,
  pub quantity: Option<u32>,
  pub amount_subtotal: Option<i64>,
  pub price: Option<Price>,
}

impl LineItem {
  pub fn product(&self) -> Option<&ProductObject> {
    self.price.as_ref()?.product.as_ref()?.as_object()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemList {
  #[serde(default)]
  pub data: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
  pub id: String,
  pub url: Option<String>,
  pub currency: Option<String>,
  pub customer_email: Option<String>,
  pub customer_details: Option<CustomerDetails>,
  pub shipping_details: Option<ShippingDetails>,
  pub collected_information: Option<CollectedInformation>,
  pub amount_subtotal: Option<i64>,
  pub amount_total: Option<i64>,
  pub total_details: Option<TotalDetails>,
  pub line_items: Option<LineItemList>,
  #[serde(default)]
  pub metadata: BTreeMap<String, String>,
}

impl CheckoutSession {
  /// Shipping details at the top level or, on newer API versions, under collected information.
  pub fn shipping(&self) -> Option<&ShippingDetails> {
    self
      .shipping_details
      .as_ref()
      .or_else(|| self.collected_information.as_ref()?.shipping_details.as_ref())
  }

  pub fn line_items(&self) -> &[LineItem] {
    self.line_items.as_ref().map(|l| l.data.as_slice()).unwrap_or_default()
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
  pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  pub data: EventData,
}

impl WebhookEvent {
  /// The `id` of the event's object, when it has one.
  pub fn object_id(&self) -> Option<&str> {
    self.data.object.get("id").and_then(serde_json::Value::as_str)
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CreatedSession>;

  /// Retrieves a session with its line items and their products expanded.
  async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession>;
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn request() -> CheckoutSessionRequest {
    CheckoutSessionRequest {
      currency: "gbp".into(),
      success_url: "https://shop.example/success?session_id={CHECKOUT_SESSION_ID}".into(),
      cancel_url: "https://shop.example/cart".into(),
      allowed_countries: vec!["GB".into(), "IE".into()],
      collect_phone: true,
      lines: vec![CheckoutLine {
        name: "Metal Wallet Photo Card".into(),
        description: Some("Photo + custom text".into()),
        unit_amount_pence: 550,
        quantity: 1,
        metadata: BTreeMap::from([("custom_text".to_string(), "Nan".to_string())]),
      }],
      shipping: Some(ShippingRate {
        display_name: "Shipping (UK)".into(),
        amount_pence: 220,
      }),
      metadata: BTreeMap::from([("shipping_zone".to_string(), "UK".to_string())]),
    }
  }

  #[test]
  fn form_params_use_bracket_notation() {
    let params = request().to_form_params();
    let has = |k: &str, v: &str| params.iter().any(|(pk, pv)| pk == k && pv == v);
    assert!(has("mode", "payment"));
    assert!(has("shipping_address_collection[allowed_countries][1]", "IE"));
    assert!(has("phone_number_collection[enabled]", "true"));
    assert!(has("line_items[0][price_data][unit_amount]", "550"));
    assert!(has("line_items[0][price_data][product_data][metadata][custom_text]", "Nan"));
    assert!(has("shipping_options[0][shipping_rate_data][fixed_amount][amount]", "220"));
    assert!(has("metadata[shipping_zone]", "UK"));
  }

  #[test]
  fn free_shipping_sends_no_rate() {
    let mut req = request();
    req.shipping = None;
    assert!(!req.to_form_params().iter().any(|(k, _)| k.starts_with("shipping_options")));
  }

  #[test]
  fn decodes_expanded_session() {
    let session: CheckoutSession = serde_json::from_value(json!({
      "id": "cs_test_1",
      "object": "checkout.session",
      "customer_details": { "email": "buyer@example.com", "name": "Ada", "phone": null, "address": null },
      "collected_information": { "shipping_details": { "name": "Ada", "address": { "line1": "1 High St", "city": "Leeds", "postal_code": "LS1 1AA", "country": "GB" } } },
      "amount_subtotal": 550,
      "amount_total": 770,
      "total_details": { "amount_shipping": 220, "amount_tax": 0 },
      "line_items": { "object": "list", "data": [
        { "description": "Metal Wallet Photo Card", "quantity": 1, "amount_subtotal": 550,
          "price": { "unit_amount": 550, "product": { "id": "prod_1", "name": "Metal Wallet Photo Card", "metadata": { "font": "Script" } } } },
        { "description": "Loose", "quantity": 2, "amount_subtotal": 800, "price": { "unit_amount": 400, "product": "prod_2" } }
      ] }
    }))
    .unwrap();

    assert_eq!(session.shipping().unwrap().address.as_ref().unwrap().city.as_deref(), Some("Leeds"));
    let items = session.line_items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].product().unwrap().metadata.get("font").map(String::as_str), Some("Script"));
    assert!(items[1].product().is_none());
  }

  #[test]
  fn decodes_event_envelope() {
    let event: WebhookEvent = serde_json::from_value(json!({
      "id": "evt_1",
      "type": "checkout.session.completed",
      "data": { "object": { "id": "cs_test_1" } }
    }))
    .unwrap();
    assert_eq!(event.event_type, CHECKOUT_COMPLETED);
    assert_eq!(event.object_id(), Some("cs_test_1"));
  }
}
