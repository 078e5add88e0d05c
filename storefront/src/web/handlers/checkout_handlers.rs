// storefront/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use conveyor::{ContextData, PipelineResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::ShippingZone;
use crate::pipelines::contexts::{CartLineInput, CheckoutCtxData};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequestPayload {
  #[serde(default)]
  pub items: Vec<CartLineInput>,
  #[serde(default)]
  pub shipping_zone: Option<ShippingZone>,
}

#[instrument(
  name = "handler::create_checkout_session",
  skip(app_state, req_payload),
  fields(lines = req_payload.items.len(), zone = ?req_payload.shipping_zone)
)]
pub async fn create_checkout_session_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<CheckoutRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = req_payload.into_inner();
  let ctx = ContextData::new(CheckoutCtxData::new(
    app_state.get_ref().clone(),
    payload.items,
    payload.shipping_zone.unwrap_or_default(),
  ));

  match app_state.conveyor.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx.read();
      let session = guard
        .session
        .as_ref()
        .ok_or_else(|| AppError::Internal("Checkout finished without a payment session".to_string()))?;
      info!(session_id = %session.id, total_pence = guard.subtotal_pence + guard.shipping_pence, "Checkout session created.");
      Ok(HttpResponse::Ok().json(json!({ "url": session.url, "sessionId": session.id })))
    }
    PipelineResult::Stopped => {
      warn!("Checkout pipeline stopped before a session was created.");
      Err(AppError::Internal("Checkout was halted.".to_string()))
    }
  }
}
