// storefront/src/services/email.rs

//! Order notifications: who gets which email for a new or shipped order.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::errors::Result;
use crate::models::Order;
use crate::services::templates::render_order_email;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
  pub from: String,
  pub to: String,
  pub subject: String,
  pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
  /// Sends one message and returns the provider's message id.
  async fn send(&self, message: &EmailMessage) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEmailKind {
  NewOrder,
  Shipped,
}

pub fn order_subject(order: &Order, kind: OrderEmailKind) -> String {
  match kind {
    OrderEmailKind::NewOrder => format!("Your order {} – Generations in Making", order.id),
    OrderEmailKind::Shipped => format!(
      "Shipped: {} – {}",
      order.id,
      order.tracking_number.as_deref().unwrap_or_default()
    ),
  }
}

/// Sends order emails from the store address, with an optional admin copy.
#[derive(Clone)]
pub struct OrderNotifier {
  mailer: Arc<dyn Mailer>,
  from: String,
  admin_to: String,
}

impl OrderNotifier {
  pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>, admin_to: impl Into<String>) -> Self {
    Self {
      mailer,
      from: from.into(),
      admin_to: admin_to.into(),
    }
  }

  /// Buyer copy unless the address is unknown; admin copy when one is configured.
  #[instrument(name = "email::send_order_emails", skip(self, order), fields(order_id = %order.id))]
  pub async fn send_order_emails(&self, order: &Order, kind: OrderEmailKind) -> Result<usize> {
    let subject = order_subject(order, kind);
    let html = render_order_email(order);
    let mut sent = 0;

    if order.has_customer_email() {
      self
        .mailer
        .send(&EmailMessage {
          from: self.from.clone(),
          to: order.customer_email.trim().to_string(),
          subject: subject.clone(),
          html: html.clone(),
        })
        .await?;
      sent += 1;
    }

    if !self.admin_to.is_empty() {
      self
        .mailer
        .send(&EmailMessage {
          from: self.from.clone(),
          to: self.admin_to.clone(),
          subject: format!("[ADMIN] {}", subject),
          html,
        })
        .await?;
      sent += 1;
    }

    info!(sent, "Order emails dispatched.");
    Ok(sent)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::OrderStatus;
  use crate::services::email_mock::RecordingMailer;
  use chrono::Utc;

  fn order(email: &str) -> Order {
    Order {
      id: "GIM-XYZ789".into(),
      created_at: Utc::now(),
      status: OrderStatus::Paid,
      currency: "gbp".into(),
      customer_email: email.into(),
      shipping_address: None,
      items: vec![],
      subtotal_pence: 0,
      shipping_pence: 0,
      total_pence: 0,
      payment_session_id: "cs_1".into(),
      tracking_number: None,
    }
  }

  #[test]
  fn subjects() {
    let mut o = order("a@b.c");
    assert_eq!(order_subject(&o, OrderEmailKind::NewOrder), "Your order GIM-XYZ789 – Generations in Making");
    o.tracking_number = Some("RM1".into());
    assert_eq!(order_subject(&o, OrderEmailKind::Shipped), "Shipped: GIM-XYZ789 – RM1");
  }

  #[tokio::test]
  async fn buyer_and_admin_copies() {
    let mailer = Arc::new(RecordingMailer::new());
    let notifier = OrderNotifier::new(mailer.clone(), "Shop <shop@example.com>", "owner@example.com");

    let sent = notifier.send_order_emails(&order("buyer@example.com"), OrderEmailKind::NewOrder).await.unwrap();
    assert_eq!(sent, 2);
    let outbox = mailer.sent();
    assert_eq!(outbox[0].to, "buyer@example.com");
    assert_eq!(outbox[1].to, "owner@example.com");
    assert!(outbox[1].subject.starts_with("[ADMIN] Your order GIM-XYZ789"));
    assert_eq!(outbox[0].from, "Shop <shop@example.com>");
  }

  #[tokio::test]
  async fn unknown_buyer_and_no_admin_sends_nothing() {
    let mailer = Arc::new(RecordingMailer::new());
    let notifier = OrderNotifier::new(mailer.clone(), "Shop <shop@example.com>", "");
    let sent = notifier.send_order_emails(&order("unknown"), OrderEmailKind::Shipped).await.unwrap();
    assert_eq!(sent, 0);
    assert!(mailer.sent().is_empty());
  }
}
