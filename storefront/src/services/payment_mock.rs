// storefront/src/services/payment_mock.rs

//! In-memory payment gateway. Created sessions are kept so a later retrieval
//! (from a simulated webhook) sees the same lines and amounts.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::services::payments::{
  CheckoutSession, CheckoutSessionRequest, CreatedSession, Expandable, LineItem, LineItemList, PaymentGateway, Price,
  ProductObject, TotalDetails,
};

#[derive(Default)]
pub struct MockPayments {
  sessions: Mutex<HashMap<String, CheckoutSession>>,
  requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl MockPayments {
  pub fn new() -> Self {
    Self::default()
  }

  /// Every create request received, oldest first.
  pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
    self.requests.lock().clone()
  }

  /// Stores or replaces a session returned by later retrievals.
  pub fn insert_session(&self, session: CheckoutSession) {
    self.sessions.lock().insert(session.id.clone(), session);
  }

  /// Applies `f` to a stored session, e.g. to fill in what the buyer entered on the hosted page.
  pub fn update_session(&self, session_id: &str, f: impl FnOnce(&mut CheckoutSession)) -> bool {
    match self.sessions.lock().get_mut(session_id) {
      Some(session) => {
        f(session);
        true
      }
      None => false,
    }
  }

  fn session_from_request(id: &str, url: &str, request: &CheckoutSessionRequest) -> CheckoutSession {
    let data: Vec<LineItem> = request
      .lines
      .iter()
      .enumerate()
      .map(|(i, line)| LineItem {
        description: Some(line.name.clone()),
        quantity: Some(line.quantity),
        amount_subtotal: Some(line.unit_amount_pence * i64::from(line.quantity)),
        price: Some(Price {
          unit_amount: Some(line.unit_amount_pence),
          product: Some(Expandable::Object(ProductObject {
            id: format!("prod_mock_{}", i),
            name: Some(line.name.clone()),
            description: line.description.clone(),
            metadata: line.metadata.clone(),
          })),
        }),
      })
      .collect();
    let subtotal: i64 = data.iter().filter_map(|l| l.amount_subtotal).sum();
    let shipping = request.shipping.as_ref().map(|s| s.amount_pence).unwrap_or(0);

    CheckoutSession {
      id: id.to_string(),
      url: Some(url.to_string()),
      currency: Some(request.currency.clone()),
      amount_subtotal: Some(subtotal),
      amount_total: Some(subtotal + shipping),
      total_details: Some(TotalDetails {
        amount_shipping: Some(shipping),
      }),
      line_items: Some(LineItemList { data }),
      metadata: request.metadata.clone(),
      ..CheckoutSession::default()
    }
  }
}

#[async_trait]
impl PaymentGateway for MockPayments {
  #[instrument(name = "payment_mock::create_checkout_session", skip_all)]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CreatedSession> {
    if request.lines.is_empty() {
      return Err(AppError::Payment("A checkout session needs at least one line item".to_string()));
    }
    let id = format!("cs_mock_{}", Uuid::new_v4().simple());
    let url = format!("https://checkout.mock.local/pay/{}", id);
    let session = Self::session_from_request(&id, &url, request);
    self.sessions.lock().insert(id.clone(), session);
    self.requests.lock().push(request.clone());
    info!(session_id = %id, "Simulated checkout session created.");
    Ok(CreatedSession { id, url })
  }

  #[instrument(name = "payment_mock::retrieve_checkout_session", skip(self))]
  async fn retrieve_checkout_session(&self, session_id: &str) -> Result<CheckoutSession> {
    self
      .sessions
      .lock()
      .get(session_id)
      .cloned()
      .ok_or_else(|| AppError::Payment(format!("No such checkout session: '{}'", session_id)))
  }
}
