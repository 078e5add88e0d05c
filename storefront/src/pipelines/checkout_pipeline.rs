// storefront/src/pipelines/checkout_pipeline.rs

use conveyor::{Conveyor, ContextData, Pipeline, PipelineControl};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{catalog, Cart};
use crate::pipelines::contexts::{CartLineInput, CheckoutCtxData};
use crate::services::payments::{CheckoutLine, CheckoutSessionRequest, ShippingRate};
use crate::state::AppState;

const CURRENCY: &str = "gbp";
const ALLOWED_COUNTRIES: [&str; 2] = ["GB", "IE"];

fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Rebuilds the cart from catalog data. Client prices and quantities are ignored.
pub fn cart_from_input(items: &[CartLineInput]) -> Result<Cart, AppError> {
  if items.is_empty() {
    return Err(AppError::Validation("Cart is empty".to_string()));
  }

  let mut cart = Cart::new();
  for input in items {
    let product = catalog::find(&input.id)
      .ok_or_else(|| AppError::Validation(format!("Unknown product '{}'", input.id)))?;
    let option = match non_empty(&input.option_id) {
      Some(option_id) => product.option(option_id).ok_or_else(|| {
        AppError::Validation(format!("Unknown option '{}' for product '{}'", option_id, product.id))
      })?,
      None => product
        .default_option()
        .ok_or_else(|| AppError::Validation(format!("Product '{}' has no options", product.id)))?,
    };

    let text = non_empty(&input.custom_text);
    if option.requires_text && text.is_none() {
      return Err(AppError::Validation(format!(
        "Please enter the text for '{}' ({})",
        product.name, option.label
      )));
    }

    let line = cart.add(product.id, product.name, option.price_pence, Some(option.id));
    if let Some(url) = non_empty(&input.upload_url) {
      cart.set_upload(&line.line_id, url, None);
    }
    if let Some(text) = text {
      cart.set_text(&line.line_id, text);
      if let Some(font) = non_empty(&input.font) {
        cart.set_font(&line.line_id, font);
      }
    }
  }
  Ok(cart)
}

fn line_metadata(line: &crate::models::CartLine) -> BTreeMap<String, String> {
  let mut metadata = BTreeMap::new();
  metadata.insert("product_id".to_string(), line.product_id.clone());
  if let Some(option_id) = &line.option_id {
    metadata.insert("option_id".to_string(), option_id.clone());
  }
  if let Some(url) = &line.upload_url {
    metadata.insert("upload_url".to_string(), url.clone());
  }
  if let Some(text) = &line.custom_text {
    metadata.insert("custom_text".to_string(), text.clone());
  }
  if let Some(font) = &line.font {
    metadata.insert("font".to_string(), font.clone());
  }
  metadata
}

pub fn register_checkout_pipeline(registry: &Arc<Conveyor<AppError>>, _app_state: &AppState) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_cart", false, None),
    ("price_cart", false, None),
    ("create_payment_session", false, None),
  ]);

  p.on_root("validate_cart", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let cart = {
        let guard = ctx_data.read();
        cart_from_input(&guard.items)?
      };
      info!(lines = cart.lines().len(), "Checkout cart validated against the catalog.");
      ctx_data.write().cart = cart;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("price_cart", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx_data.write();
      guard.subtotal_pence = guard.cart.subtotal_pence();
      guard.shipping_pence = guard.cart.shipping_pence(guard.shipping_zone);
      info!(
        subtotal_pence = guard.subtotal_pence,
        shipping_pence = guard.shipping_pence,
        zone = guard.shipping_zone.as_str(),
        "Checkout priced."
      );
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p.on_root("create_payment_session", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (request, payments) = {
        let guard = ctx_data.read();
        let site_url = &guard.app_state.config.site_url;
        let lines = guard
          .cart
          .lines()
          .iter()
          .map(|line| CheckoutLine {
            name: line.name.clone(),
            description: line
              .option_id
              .as_deref()
              .and_then(|id| catalog::find(&line.product_id)?.option(id))
              .map(|o| o.label.to_string()),
            unit_amount_pence: line.unit_price_pence,
            quantity: line.quantity,
            metadata: line_metadata(line),
          })
          .collect();
        let shipping = (guard.shipping_pence > 0).then(|| ShippingRate {
          display_name: format!("Shipping ({})", guard.shipping_zone.as_str()),
          amount_pence: guard.shipping_pence,
        });
        let request = CheckoutSessionRequest {
          currency: CURRENCY.to_string(),
          success_url: format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", site_url),
          cancel_url: format!("{}/cart", site_url),
          allowed_countries: ALLOWED_COUNTRIES.iter().map(|c| c.to_string()).collect(),
          collect_phone: true,
          lines,
          shipping,
          metadata: BTreeMap::from([("shipping_zone".to_string(), guard.shipping_zone.as_str().to_string())]),
        };
        (request, guard.app_state.payments.clone())
      };

      let session = payments.create_checkout_session(&request).await.map_err(|e| {
        warn!(error = %e, "Payment provider refused the checkout session.");
        e
      })?;
      info!(session_id = %session.id, "Checkout session ready.");
      ctx_data.write().session = Some(session);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  registry.register_pipeline(p);
  info!("Checkout pipeline registered.");
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(id: &str, option: Option<&str>) -> CartLineInput {
    CartLineInput {
      id: id.to_string(),
      option_id: option.map(str::to_string),
      ..CartLineInput::default()
    }
  }

  #[test]
  fn empty_cart_is_rejected() {
    let err = cart_from_input(&[]).unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "Cart is empty"));
  }

  #[test]
  fn prices_come_from_the_catalog() {
    let mut line = input("steel-photo", Some("steel-100x200"));
    line.unit_price = Some(serde_json::json!(0.01));
    line.qty = Some(serde_json::json!(5));
    let cart = cart_from_input(&[line]).unwrap();
    assert_eq!(cart.lines()[0].unit_price_pence, 4000);
    assert_eq!(cart.lines()[0].quantity, 1);
  }

  #[test]
  fn missing_option_uses_the_first() {
    let cart = cart_from_input(&[input("metal-wallet-photo", None)]).unwrap();
    assert_eq!(cart.lines()[0].option_id.as_deref(), Some("wallet-photo-only"));
    assert_eq!(cart.subtotal_pence(), 400);
  }

  #[test]
  fn text_option_needs_text() {
    let err = cart_from_input(&[input("metal-wallet-photo", Some("wallet-photo-text"))]).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let mut with_text = input("metal-wallet-photo", Some("wallet-photo-text"));
    with_text.custom_text = Some("  Always  ".into());
    with_text.font = Some("Script".into());
    with_text.upload_url = Some("https://blob.example/uploads/a.jpg".into());
    let cart = cart_from_input(&[with_text]).unwrap();
    let line = &cart.lines()[0];
    assert_eq!(line.custom_text.as_deref(), Some("Always"));
    assert_eq!(line.font.as_deref(), Some("Script"));
    assert_eq!(line.upload_url.as_deref(), Some("https://blob.example/uploads/a.jpg"));

    let metadata = line_metadata(line);
    assert_eq!(metadata.get("custom_text").map(String::as_str), Some("Always"));
  }

  #[test]
  fn unknown_product_or_option() {
    assert!(cart_from_input(&[input("mug", None)]).is_err());
    assert!(cart_from_input(&[input("steel-photo", Some("steel-1x1"))]).is_err());
  }
}
