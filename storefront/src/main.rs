// storefront/src/main.rs

use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;

use keepsake::config::{AppConfig, LogFormat};
use keepsake::state::{AppState, Services};
use keepsake::telemetry::init_tracing;
use keepsake::web::configure_app_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let config = AppConfig::from_env();
  init_tracing(config.as_ref().map(|c| c.log_format).unwrap_or(LogFormat::Text));

  let config = match config {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  tracing::info!("Starting keepsake storefront server...");
  if config.uses_mock_services() {
    tracing::warn!("USE_MOCK_SERVICES is set: payments, email, KV and blob storage run in memory.");
  }

  let services = match Services::from_config(&config) {
    Ok(services) => services,
    Err(e) => {
      tracing::error!(error = %e, "Failed to set up service clients.");
      return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
    }
  };

  let server_address = format!("{}:{}", config.server_host, config.server_port);
  let app_state = AppState::new(config, services);
  tracing::info!("Pipelines registered. Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(web::Data::new(app_state.clone()))
      .wrap(TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
