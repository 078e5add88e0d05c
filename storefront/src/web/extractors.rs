// storefront/src/web/extractors.rs

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::services::auth_service::{check_country, request_country, token_matches, ADMIN_TOKEN_HEADER, SESSION_COOKIE};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAuthMethod {
  SessionCookie,
  TokenHeader,
}

/// Guards admin endpoints: country lock first, then a live session cookie or
/// the admin token header.
#[derive(Debug)]
pub struct AdminSession {
  pub method: AdminAuthMethod,
}

/// Country of the request as reported by the edge proxy, uppercased.
pub fn country_of(req: &HttpRequest) -> String {
  request_country(|name| req.headers().get(name).and_then(|v| v.to_str().ok()))
}

impl FromRequest for AdminSession {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let country = country_of(req);
    let session_id = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
    let token = req
      .headers()
      .get(ADMIN_TOKEN_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string);

    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("Application state is not configured".to_string()))?;
      check_country(state.config.admin_uk_only, &country)?;

      if let Some(token) = token {
        if token_matches(&state.config.admin_token, &token) {
          debug!("Admin authenticated by token header.");
          return Ok(AdminSession {
            method: AdminAuthMethod::TokenHeader,
          });
        }
      }
      if let Some(session_id) = session_id {
        if state.sessions.is_valid(&session_id).await? {
          debug!("Admin authenticated by session cookie.");
          return Ok(AdminSession {
            method: AdminAuthMethod::SessionCookie,
          });
        }
      }

      warn!("Unauthenticated admin request.");
      Err(AppError::Auth("Unauthorized".to_string()))
    })
  }
}
