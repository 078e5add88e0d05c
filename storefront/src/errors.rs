// storefront/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use conveyor::ConveyorError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Auth(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("Webhook signature verification failed: {0}")]
  WebhookSignature(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Key-value store error: {0}")]
  Store(String),

  #[error("Payment provider error: {0}")]
  Payment(String),

  #[error("Email provider error: {0}")]
  Email(String),

  #[error("Blob storage error: {0}")]
  Blob(String),

  #[error("Workflow error: {source}")]
  Workflow {
    #[from]
    source: ConveyorError,
  },

  #[error("Internal server error: {0}")]
  Internal(String),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::WebhookSignature(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Config(_)
      | AppError::Store(_)
      | AppError::Payment(_)
      | AppError::Email(_)
      | AppError::Blob(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Rejecting request");
    }
    HttpResponse::build(status).json(json!({ "error": self.to_string() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
