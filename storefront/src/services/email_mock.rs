// storefront/src/services/email_mock.rs

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::services::email::{EmailMessage, Mailer};

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
  outbox: Mutex<Vec<EmailMessage>>,
  failures_left: Mutex<usize>,
}

impl RecordingMailer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sent(&self) -> Vec<EmailMessage> {
    self.outbox.lock().clone()
  }

  /// The next `count` sends fail as if the provider were down.
  pub fn fail_next(&self, count: usize) {
    *self.failures_left.lock() = count;
  }
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(&self, message: &EmailMessage) -> Result<String> {
    if message.to.trim().is_empty() {
      return Err(AppError::Email("Recipient address is empty".to_string()));
    }
    {
      let mut failures_left = self.failures_left.lock();
      if *failures_left > 0 {
        *failures_left -= 1;
        warn!(to = %message.to, subject = %message.subject, "Simulated email failure.");
        return Err(AppError::Email("Simulated email send failure".to_string()));
      }
    }
    let message_id = format!("mock_email_{}", uuid::Uuid::new_v4());
    info!(to = %message.to, subject = %message.subject, %message_id, "Simulated email send.");
    self.outbox.lock().push(message.clone());
    Ok(message_id)
  }
}
