// storefront/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use conveyor::{ContextData, PipelineResult};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::{PaymentWebhookCtxData, WebhookOutcome};
use crate::services::webhook_signature::SIGNATURE_HEADER;
use crate::state::AppState;

#[instrument(name = "handler::payment_webhook", skip(app_state, req, body), fields(size = body.len()))]
pub async fn payment_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let signature_header = req
    .headers()
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(String::from);

  let ctx = ContextData::new(PaymentWebhookCtxData::new(
    app_state.get_ref().clone(),
    body,
    signature_header,
  ));

  let result = app_state.conveyor.run(ctx.clone()).await.map_err(|e| {
    warn!(error = %e, "Payment webhook failed.");
    e
  })?;
  let outcome = ctx.read().outcome.clone();

  match (result, outcome) {
    (PipelineResult::Completed, WebhookOutcome::Created(order_id))
    | (PipelineResult::Completed, WebhookOutcome::Resumed(order_id)) => {
      info!(%order_id, "Payment webhook produced a confirmed order.");
      Ok(HttpResponse::Ok().json(json!({ "ok": true, "orderId": order_id })))
    }
    (PipelineResult::Stopped, WebhookOutcome::Ignored(event_type)) => {
      Ok(HttpResponse::Ok().json(json!({ "ok": true, "ignored": event_type })))
    }
    (PipelineResult::Stopped, WebhookOutcome::Duplicate(order_id)) => {
      Ok(HttpResponse::Ok().json(json!({ "ok": true, "duplicate": order_id })))
    }
    (result, outcome) => {
      warn!(?result, ?outcome, "Payment webhook ended in an unexpected state.");
      Err(AppError::Internal("Webhook processing ended unexpectedly".to_string()))
    }
  }
}
