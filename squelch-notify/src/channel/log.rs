//! Log delivery channel
//!
//! Writes the notification to the tracing stream instead of leaving the
//! process. Useful as a dry-run channel, in tests, and as the safe default
//! before a real transport is configured.

use async_trait::async_trait;

use super::{DeliveryChannel, DeliveryError, DeliveryReceipt};
use crate::composer::NotificationPayload;

/// Tracing sink channel
#[derive(Debug, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        LogChannel
    }
}

#[async_trait]
impl DeliveryChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        tracing::info!(
            subject = %payload.subject,
            recipients = ?payload.recipients,
            sections = payload.sections.len(),
            "notification (log channel)"
        );
        tracing::debug!(body = %payload.body(), "notification body");

        Ok(DeliveryReceipt {
            channel: self.name(),
            detail: format!("logged {} sections", payload.sections.len()),
        })
    }
}
