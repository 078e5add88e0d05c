// storefront/src/web/routes.rs

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::errors::AppError;
use crate::web::handlers::{admin_handlers, catalog_handlers, checkout_handlers, upload_handlers, webhook_handlers};

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid JSON body: {}", err)).into()
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler));
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(catalog_handlers::health_check_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(catalog_handlers::list_products_handler))
          .route("/{product_id}", web::get().to(catalog_handlers::get_product_handler)),
      )
      .service(
        web::scope("/stripe")
          .route(
            "/create-checkout-session",
            web::post().to(checkout_handlers::create_checkout_session_handler),
          )
          .route("/webhook", web::post().to(webhook_handlers::payment_webhook_handler)),
      )
      .route("/upload", web::post().to(upload_handlers::upload_handler))
      .service(
        web::scope("/admin")
          .route("/login", web::post().to(admin_handlers::login_handler))
          .route("/logout", web::post().to(admin_handlers::logout_handler))
          .route("/auth", web::get().to(admin_handlers::auth_check_handler))
          .route("/orders", web::get().to(admin_handlers::list_orders_handler))
          .route("/orders/status", web::post().to(admin_handlers::update_status_handler))
          .route("/orders/{id}", web::get().to(admin_handlers::get_order_handler))
          .route("/orders/{id}/packing-slip", web::get().to(admin_handlers::packing_slip_handler)),
      ),
  );
}
