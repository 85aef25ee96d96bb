//! Outbound email adapters.
//!
//! Delivery is best effort everywhere it is used, so these adapters never
//! fail the calling operation.

use std::sync::Mutex;

use async_trait::async_trait;

use ims_identity::{EmailDelivery, ProviderError};

/// Mailer that only logs. Used where no SMTP relay is configured.
#[derive(Debug, Default)]
pub struct LoggingMailer;

impl LoggingMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailDelivery for LoggingMailer {
    async fn send_password_reset(&self, to: &str) -> Result<(), ProviderError> {
        tracing::info!(to, "password reset email (logging mailer, not sent)");
        Ok(())
    }
}

/// Mailer that records recipients for assertion in tests.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailDelivery for RecordingMailer {
    async fn send_password_reset(&self, to: &str) -> Result<(), ProviderError> {
        self.sent
            .lock()
            .map_err(|_| ProviderError::Unreachable("mailer state poisoned".to_string()))?
            .push(to.to_string());
        Ok(())
    }
}
