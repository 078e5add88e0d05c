// tests/common/mod.rs
#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{test, web, App};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Level;

use keepsake::config::AppConfig;
use keepsake::services::blob::MemoryBlob;
use keepsake::services::email_mock::RecordingMailer;
use keepsake::services::kv::MemoryKv;
use keepsake::services::payment_mock::MockPayments;
use keepsake::services::webhook_signature;
use keepsake::state::{AppState, Services};
use keepsake::web::configure_app_routes;

pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const ADMIN_EMAIL: &str = "owner@example.com";

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

/// App state over in-memory services, with handles on each backend.
pub struct TestContext {
  pub state: AppState,
  pub kv: Arc<MemoryKv>,
  pub payments: Arc<MockPayments>,
  pub mailer: Arc<RecordingMailer>,
  pub blobs: Arc<MemoryBlob>,
}

pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
  let mut vars: HashMap<String, String> = [
    ("USE_MOCK_SERVICES", "1"),
    ("ADMIN_TOKEN", ADMIN_TOKEN),
    ("STRIPE_WEBHOOK_SECRET", WEBHOOK_SECRET),
    ("ADMIN_TO_EMAIL", ADMIN_EMAIL),
    ("SITE_URL", "https://shop.example"),
  ]
  .iter()
  .map(|(k, v)| (k.to_string(), v.to_string()))
  .collect();
  for (k, v) in overrides {
    vars.insert(k.to_string(), v.to_string());
  }
  AppConfig::from_lookup(|name| vars.get(name).cloned()).expect("test config")
}

pub fn test_context(overrides: &[(&str, &str)]) -> TestContext {
  setup_tracing();
  let kv = Arc::new(MemoryKv::new());
  let payments = Arc::new(MockPayments::new());
  let mailer = Arc::new(RecordingMailer::new());
  let blobs = Arc::new(MemoryBlob::new("https://blob.test.local"));
  let services = Services {
    kv: kv.clone(),
    payments: payments.clone(),
    mailer: mailer.clone(),
    blobs: blobs.clone(),
  };
  TestContext {
    state: AppState::new(test_config(overrides), services),
    kv,
    payments,
    mailer,
    blobs,
  }
}

pub fn app(
  state: &AppState,
) -> App<
  impl ServiceFactory<
    ServiceRequest,
    Config = (),
    Response = ServiceResponse<BoxBody>,
    Error = actix_web::Error,
    InitError = (),
  >,
> {
  App::new()
    .app_data(web::Data::new(state.clone()))
    .configure(configure_app_routes)
}

pub fn completed_event(session_id: &str) -> Value {
  json!({
    "id": "evt_test_completed",
    "type": "checkout.session.completed",
    "data": { "object": { "id": session_id, "object": "checkout.session" } }
  })
}

/// A webhook delivery signed with the test secret at the current time.
pub fn signed_webhook(event: &Value) -> test::TestRequest {
  let body = serde_json::to_vec(event).expect("event json");
  let header = webhook_signature::sign(&body, WEBHOOK_SECRET, chrono::Utc::now().timestamp()).expect("signature");
  test::TestRequest::post()
    .uri("/api/stripe/webhook")
    .insert_header(("stripe-signature", header))
    .insert_header(("content-type", "application/json"))
    .set_payload(body)
}

pub fn checkout_request(body: Value) -> test::TestRequest {
  test::TestRequest::post()
    .uri("/api/stripe/create-checkout-session")
    .set_json(body)
}

pub fn admin_get(uri: &str) -> test::TestRequest {
  test::TestRequest::get().uri(uri).insert_header(("x-admin-token", ADMIN_TOKEN))
}

pub fn admin_post(uri: &str, body: Value) -> test::TestRequest {
  test::TestRequest::post()
    .uri(uri)
    .insert_header(("x-admin-token", ADMIN_TOKEN))
    .set_json(body)
}

/// Fills in what the buyer would enter on the hosted payment page.
pub fn complete_payment(payments: &MockPayments, session_id: &str) {
  let updated = payments.update_session(session_id, |session| {
    session.customer_details = Some(keepsake::services::payments::CustomerDetails {
      email: Some("buyer@example.com".to_string()),
      name: Some("Ada Lovelace".to_string()),
      phone: Some("+44 7700 900123".to_string()),
      address: None,
    });
    session.shipping_details = Some(keepsake::services::payments::ShippingDetails {
      name: Some("Ada Lovelace".to_string()),
      phone: None,
      address: Some(keepsake::services::payments::Address {
        line1: Some("12 Orchard Lane".to_string()),
        line2: None,
        city: Some("York".to_string()),
        state: None,
        postal_code: Some("YO1 7HH".to_string()),
        country: Some("GB".to_string()),
      }),
    });
  });
  assert!(updated, "session {} not found", session_id);
}
