// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ORDER_ID_PREFIX: &str = "GIM-";
const ORDER_ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ORDER_ID_SUFFIX_LEN: usize = 6;

/// Placeholder recorded when the payment provider returns no email.
pub const UNKNOWN_EMAIL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Paid,
  Shipped,
  Refunded,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Paid => "paid",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Refunded => "refunded",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
  type Err = UnknownStatus;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pending" => Ok(OrderStatus::Pending),
      "paid" => Ok(OrderStatus::Paid),
      "shipped" => Ok(OrderStatus::Shipped),
      "refunded" => Ok(OrderStatus::Refunded),
      "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
      _ => Err(UnknownStatus(s.to_string())),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub line1: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub line2: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub city: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub postal_code: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
}

impl ShippingAddress {
  /// Non-empty address lines in label order, phone excluded.
  pub fn lines(&self) -> Vec<&str> {
    [
      &self.name,
      &self.line1,
      &self.line2,
      &self.city,
      &self.state,
      &self.postal_code,
      &self.country,
    ]
    .into_iter()
    .filter_map(|v| v.as_deref())
    .filter(|v| !v.is_empty())
    .collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub name: String,
  pub quantity: u32,
  pub unit_price_pence: i64,
  pub line_total_pence: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub upload_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub custom_text: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub font: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: String,
  pub created_at: DateTime<Utc>,
  pub status: OrderStatus,
  pub currency: String,
  pub customer_email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub shipping_address: Option<ShippingAddress>,
  pub items: Vec<OrderItem>,
  pub subtotal_pence: i64,
  pub shipping_pence: i64,
  pub total_pence: i64,
  pub payment_session_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tracking_number: Option<String>,
}

impl Order {
  /// `GIM-` followed by six random base-36 characters.
  pub fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_ID_SUFFIX_LEN)
      .map(|_| ORDER_ID_ALPHABET[rng.gen_range(0..ORDER_ID_ALPHABET.len())] as char)
      .collect();
    format!("{}{}", ORDER_ID_PREFIX, suffix)
  }

  /// Whether `total = subtotal + shipping`. Reported, never enforced.
  pub fn totals_balance(&self) -> bool {
    self.subtotal_pence + self.shipping_pence == self.total_pence
  }

  /// The buyer can be emailed.
  pub fn has_customer_email(&self) -> bool {
    let email = self.customer_email.trim();
    !email.is_empty() && email != UNKNOWN_EMAIL
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn generated_ids_have_expected_shape() {
    for _ in 0..50 {
      let id = Order::generate_id();
      assert!(id.starts_with(ORDER_ID_PREFIX));
      let suffix = &id[ORDER_ID_PREFIX.len()..];
      assert_eq!(suffix.len(), 6);
      assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }
  }

  #[test]
  fn status_parses_case_insensitively_and_rejects_unknown() {
    assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
    assert_eq!("canceled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
    assert_eq!("lost".parse::<OrderStatus>().unwrap_err(), UnknownStatus("lost".to_string()));
    assert_eq!(serde_json::to_string(&OrderStatus::Refunded).unwrap(), "\"refunded\"");
  }

  #[test]
  fn unknown_or_blank_email_cannot_be_contacted() {
    let mut order = Order {
      id: Order::generate_id(),
      created_at: Utc::now(),
      status: OrderStatus::Paid,
      currency: "gbp".into(),
      customer_email: "buyer@example.com".into(),
      shipping_address: None,
      items: Vec::new(),
      subtotal_pence: 0,
      shipping_pence: 0,
      total_pence: 0,
      payment_session_id: "cs_1".into(),
      tracking_number: None,
    };
    assert!(order.has_customer_email());
    order.customer_email = UNKNOWN_EMAIL.into();
    assert!(!order.has_customer_email());
    order.customer_email = "   ".into();
    assert!(!order.has_customer_email());
  }

  #[test]
  fn address_lines_skip_blanks() {
    let addr = ShippingAddress {
      name: Some("Ada Lovelace".into()),
      line1: Some("1 High St".into()),
      line2: Some(String::new()),
      city: Some("London".into()),
      postal_code: Some("N1 1AA".into()),
      country: Some("GB".into()),
      phone: Some("+44 20 0000 0000".into()),
      ..Default::default()
    };
    assert_eq!(addr.lines(), vec!["Ada Lovelace", "1 High St", "London", "N1 1AA", "GB"]);
  }
}
