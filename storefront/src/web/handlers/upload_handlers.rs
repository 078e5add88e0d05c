// storefront/src/web/handlers/upload_handlers.rs

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use bytes::BytesMut;
use chrono::Utc;
use futures_util::StreamExt;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::blob::upload_pathname;
use crate::state::AppState;

const FILE_FIELD: &str = "file";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

struct UploadedFile {
  filename: String,
  content_type: Option<String>,
  body: BytesMut,
}

async fn read_file_field(payload: &mut Multipart) -> Result<Option<UploadedFile>, AppError> {
  while let Some(item) = payload.next().await {
    let mut field = item.map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?;
    let (name, filename) = match field.content_disposition() {
      Some(cd) => (
        cd.get_name().unwrap_or_default().to_string(),
        cd.get_filename().unwrap_or_default().to_string(),
      ),
      None => (String::new(), String::new()),
    };
    if name != FILE_FIELD {
      // Drain fields we do not use.
      while let Some(chunk) = field.next().await {
        chunk.map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?;
      }
      continue;
    }

    let content_type = field.content_type().map(|m| m.essence_str().to_string());
    let mut body = BytesMut::new();
    while let Some(chunk) = field.next().await {
      let chunk = chunk.map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?;
      if body.len() + chunk.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation("File is too large".to_string()));
      }
      body.extend_from_slice(&chunk);
    }
    return Ok(Some(UploadedFile {
      filename,
      content_type,
      body,
    }));
  }
  Ok(None)
}

#[instrument(name = "handler::upload", skip(app_state, payload))]
pub async fn upload_handler(app_state: web::Data<AppState>, mut payload: Multipart) -> Result<HttpResponse, AppError> {
  let file = read_file_field(&mut payload)
    .await?
    .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

  let content_type = file
    .content_type
    .filter(|ct| ct.starts_with("image/"))
    .ok_or_else(|| AppError::Validation("Only image files are allowed".to_string()))?;

  let pathname = upload_pathname(&file.filename, Utc::now().timestamp_millis(), Uuid::new_v4());
  let stored = app_state
    .blobs
    .put(&pathname, file.body.freeze(), &content_type)
    .await?;
  info!(pathname = %stored.pathname, size = stored.size, "Upload stored.");

  Ok(HttpResponse::Ok().json(json!({
    "ok": true,
    "url": stored.url,
    "pathname": stored.pathname,
    "contentType": stored.content_type,
    "size": stored.size,
  })))
}
