// storefront/src/web/handlers/catalog_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::models::catalog;

#[instrument(name = "handler::list_products")]
pub async fn list_products_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "products": catalog::all() }))
}

#[instrument(name = "handler::get_product")]
pub async fn get_product_handler(product_id: web::Path<String>) -> Result<HttpResponse, AppError> {
  let product = catalog::find(&product_id)
    .ok_or_else(|| AppError::NotFound(format!("Product '{}' not found", product_id)))?;
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

pub async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok" }))
}
