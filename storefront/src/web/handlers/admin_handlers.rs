// storefront/src/web/handlers/admin_handlers.rs

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use conveyor::{ContextData, PipelineResult};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::pipelines::contexts::OrderStatusCtxData;
use crate::services::auth_service::{check_country, token_matches, SESSION_COOKIE, SESSION_TTL};
use crate::services::order_store::DEFAULT_LIST_LIMIT;
use crate::services::templates::render_packing_slip;
use crate::state::AppState;
use crate::web::extractors::{country_of, AdminSession};

fn session_cookie(value: String, max_age: CookieDuration, secure: bool) -> Cookie<'static> {
  Cookie::build(SESSION_COOKIE, value)
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Lax)
    .path("/")
    .max_age(max_age)
    .finish()
}

// --- Session ---

#[derive(Deserialize)]
pub struct LoginPayload {
  #[serde(default)]
  pub token: Option<String>,
}

#[instrument(name = "handler::admin_login", skip_all)]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, AppError> {
  check_country(app_state.config.admin_uk_only, &country_of(&req))?;

  let provided = payload.token.as_deref().map(str::trim).unwrap_or_default();
  if !token_matches(&app_state.config.admin_token, provided) {
    warn!("Admin login with a wrong token.");
    return Err(AppError::Auth("Invalid token".to_string()));
  }

  let session_id = app_state.sessions.create().await?;
  info!("Admin logged in.");
  let max_age = CookieDuration::seconds(SESSION_TTL.as_secs() as i64);
  Ok(
    HttpResponse::Ok()
      .cookie(session_cookie(session_id, max_age, app_state.config.admin_cookie_secure))
      .json(json!({ "ok": true })),
  )
}

#[instrument(name = "handler::admin_logout", skip_all)]
pub async fn logout_handler(app_state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
  if let Some(cookie) = req.cookie(SESSION_COOKIE) {
    app_state.sessions.delete(cookie.value()).await?;
  }
  Ok(
    HttpResponse::Ok()
      .cookie(session_cookie(
        String::new(),
        CookieDuration::ZERO,
        app_state.config.admin_cookie_secure,
      ))
      .json(json!({ "ok": true })),
  )
}

#[instrument(name = "handler::admin_auth_check", skip_all, fields(method = ?admin.method))]
pub async fn auth_check_handler(admin: AdminSession) -> HttpResponse {
  HttpResponse::Ok().json(json!({ "ok": true }))
}

// --- Orders ---

#[derive(Deserialize, Debug)]
pub struct ListOrdersQuery {
  pub limit: Option<String>,
}

/// Non-numeric or zero limits fall back to the default.
pub fn parse_limit(raw: Option<&str>) -> usize {
  raw
    .and_then(|v| v.trim().parse::<usize>().ok())
    .filter(|n| *n > 0)
    .unwrap_or(DEFAULT_LIST_LIMIT)
}

#[instrument(name = "handler::list_orders", skip(app_state, _admin))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  _admin: AdminSession,
  query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list(parse_limit(query.limit.as_deref())).await?;
  info!(count = orders.len(), "Orders listed.");
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}

#[instrument(name = "handler::get_order", skip(app_state, _admin))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  _admin: AdminSession,
  order_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .get(&order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "order": order })))
}

#[instrument(name = "handler::packing_slip", skip(app_state, _admin))]
pub async fn packing_slip_handler(
  app_state: web::Data<AppState>,
  _admin: AdminSession,
  order_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .get(&order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  Ok(
    HttpResponse::Ok()
      .content_type("text/html; charset=utf-8")
      .body(render_packing_slip(&order)),
  )
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub tracking_number: Option<String>,
}

#[instrument(name = "handler::update_order_status", skip(app_state, _admin, payload), fields(order_id = ?payload.id, status = ?payload.status))]
pub async fn update_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminSession,
  payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = ContextData::new(OrderStatusCtxData::new(
    app_state.get_ref().clone(),
    payload.id.unwrap_or_default(),
    payload.status.unwrap_or_default(),
    payload.tracking_number,
  ));

  match app_state.conveyor.run(ctx.clone()).await? {
    PipelineResult::Completed => {
      let guard = ctx.read();
      let order = guard
        .order
        .as_ref()
        .ok_or_else(|| AppError::Internal("Status update finished without an order".to_string()))?;
      info!(shipped_email_sent = guard.shipped_email_sent, "Order status updated.");
      Ok(HttpResponse::Ok().json(json!({ "ok": true, "order": order })))
    }
    PipelineResult::Stopped => Err(AppError::Internal("Status update was halted.".to_string())),
  }
}
