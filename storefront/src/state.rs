// storefront/src/state.rs

use std::sync::Arc;
use std::time::Duration;

use conveyor::Conveyor;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::services::auth_service::AdminSessions;
use crate::services::blob::{BlobStore, MemoryBlob, VercelBlob};
use crate::services::email::{Mailer, OrderNotifier};
use crate::services::email_mock::RecordingMailer;
use crate::services::kv::{KvStore, MemoryKv, UpstashKv};
use crate::services::order_store::OrderStore;
use crate::services::payment_mock::MockPayments;
use crate::services::payments::PaymentGateway;
use crate::services::resend::ResendMailer;
use crate::services::stripe::StripeGateway;

const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
const MOCK_BLOB_BASE_URL: &str = "https://blob.mock.local";

/// The hosted-service backends the app runs against.
#[derive(Clone)]
pub struct Services {
  pub kv: Arc<dyn KvStore>,
  pub payments: Arc<dyn PaymentGateway>,
  pub mailer: Arc<dyn Mailer>,
  pub blobs: Arc<dyn BlobStore>,
}

impl Services {
  /// Everything in memory.
  pub fn in_memory() -> Self {
    Self {
      kv: Arc::new(MemoryKv::new()),
      payments: Arc::new(MockPayments::new()),
      mailer: Arc::new(RecordingMailer::new()),
      blobs: Arc::new(MemoryBlob::new(MOCK_BLOB_BASE_URL)),
    }
  }

  /// HTTP clients for the configured providers, or in-memory backends in mock mode.
  pub fn from_config(config: &AppConfig) -> Result<Self> {
    let Some(creds) = config.services.as_ref() else {
      return Ok(Self::in_memory());
    };
    let client = reqwest::Client::builder()
      .timeout(HTTP_TIMEOUT)
      .build()
      .map_err(|e| AppError::Config(format!("HTTP client setup failed: {}", e)))?;

    Ok(Self {
      kv: Arc::new(UpstashKv::new(client.clone(), &creds.kv_rest_url, &creds.kv_rest_token)),
      payments: Arc::new(StripeGateway::new(
        client.clone(),
        &creds.stripe_api_base,
        &creds.stripe_secret_key,
      )),
      mailer: Arc::new(ResendMailer::new(client.clone(), &creds.resend_api_key)),
      blobs: Arc::new(VercelBlob::new(client, &creds.blob_api_url, &creds.blob_token)),
    })
  }
}

#[derive(Clone)]
pub struct AppState {
  pub conveyor: Arc<Conveyor<AppError>>,
  pub config: Arc<AppConfig>,
  pub orders: OrderStore,
  pub sessions: AdminSessions,
  pub payments: Arc<dyn PaymentGateway>,
  pub notifier: OrderNotifier,
  pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
  /// Builds the state and registers every pipeline on a fresh registry.
  pub fn new(config: AppConfig, services: Services) -> Self {
    let notifier = OrderNotifier::new(
      services.mailer.clone(),
      config.order_from_email.clone(),
      config.admin_to_email.clone(),
    );
    let state = Self {
      conveyor: Arc::new(Conveyor::new()),
      config: Arc::new(config),
      orders: OrderStore::new(services.kv.clone()),
      sessions: AdminSessions::new(services.kv),
      payments: services.payments,
      notifier,
      blobs: services.blobs,
    };
    crate::pipelines::register_all_pipelines(&state.conveyor, &state);
    state
  }
}
