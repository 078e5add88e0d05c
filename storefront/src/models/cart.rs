// storefront/src/models/cart.rs

//! Cart lines and shipping rules. Photo products are always one unit per
//! line so every line can carry its own upload and personalisation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::WALLET_PRODUCT_ID;

const INTL_SHIPPING_PENCE: i64 = 1440;
const UK_WALLET_SHIPPING_PENCE: i64 = 220;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShippingZone {
  #[default]
  #[serde(rename = "UK")]
  Uk,
  #[serde(rename = "INTL")]
  Intl,
}

impl ShippingZone {
  pub fn as_str(self) -> &'static str {
    match self {
      ShippingZone::Uk => "UK",
      ShippingZone::Intl => "INTL",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
  pub product_id: String,
  pub line_id: String,
  pub name: String,
  pub unit_price_pence: i64,
  pub quantity: u32,
  pub option_id: Option<String>,
  pub custom_text: Option<String>,
  pub font: Option<String>,
  pub upload_url: Option<String>,
  pub upload_name: Option<String>,
}

impl CartLine {
  pub fn line_total_pence(&self) -> i64 {
    self.unit_price_pence * i64::from(self.quantity)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
  lines: Vec<CartLine>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lines(&self) -> &[CartLine] {
    &self.lines
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  /// Appends a new single-unit line and returns a copy of it.
  pub fn add(&mut self, product_id: &str, name: &str, unit_price_pence: i64, option_id: Option<&str>) -> CartLine {
    let line = CartLine {
      product_id: product_id.to_string(),
      line_id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      unit_price_pence,
      quantity: 1,
      option_id: option_id.map(str::to_string),
      custom_text: None,
      font: None,
      upload_url: None,
      upload_name: None,
    };
    self.lines.push(line.clone());
    line
  }

  pub fn remove(&mut self, line_id: &str) {
    self.lines.retain(|l| l.line_id != line_id);
  }

  fn line_mut(&mut self, line_id: &str) -> Option<&mut CartLine> {
    self.lines.iter_mut().find(|l| l.line_id == line_id)
  }

  pub fn set_upload(&mut self, line_id: &str, upload_url: &str, upload_name: Option<&str>) {
    if let Some(line) = self.line_mut(line_id) {
      line.upload_url = Some(upload_url.to_string());
      line.upload_name = upload_name.map(str::to_string);
    }
  }

  pub fn set_text(&mut self, line_id: &str, custom_text: &str) {
    if let Some(line) = self.line_mut(line_id) {
      line.custom_text = Some(custom_text.to_string());
    }
  }

  pub fn set_font(&mut self, line_id: &str, font: &str) {
    if let Some(line) = self.line_mut(line_id) {
      line.font = Some(font.to_string());
    }
  }

  pub fn subtotal_pence(&self) -> i64 {
    self.lines.iter().map(CartLine::line_total_pence).sum()
  }

  /// International is a flat rate; UK shipping is only charged for wallet cards.
  pub fn shipping_pence(&self, zone: ShippingZone) -> i64 {
    match zone {
      ShippingZone::Intl => INTL_SHIPPING_PENCE,
      ShippingZone::Uk if self.lines.iter().any(|l| l.product_id == WALLET_PRODUCT_ID) => UK_WALLET_SHIPPING_PENCE,
      ShippingZone::Uk => 0,
    }
  }
}
