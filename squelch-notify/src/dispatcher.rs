//! The dispatcher
//!
//! Owns exactly one delivery channel and pushes composed payloads through
//! it. Transport failures come straight back to the caller — the
//! dispatcher never retries, drops, or reorders.

use crate::channel::{DeliveryChannel, DeliveryError, DeliveryReceipt, build_channel};
use crate::composer::NotificationPayload;
use crate::config::ChannelConfig;

/// Sends composed payloads through the configured channel
pub struct Dispatcher {
    channel: Box<dyn DeliveryChannel>,
}

impl Dispatcher {
    /// Wrap an existing channel (host-provided transports plug in here)
    pub fn new(channel: Box<dyn DeliveryChannel>) -> Self {
        Dispatcher { channel }
    }

    /// Build the dispatcher for a channel configuration
    pub fn from_config(config: &ChannelConfig) -> Result<Self, DeliveryError> {
        Ok(Dispatcher {
            channel: build_channel(config)?,
        })
    }

    /// Transmit one payload, reporting the transport's verdict
    pub async fn deliver(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        match self.channel.deliver(payload).await {
            Ok(receipt) => {
                tracing::debug!(
                    channel = receipt.channel,
                    detail = %receipt.detail,
                    "delivery complete"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::error!(
                    channel = self.channel.name(),
                    %err,
                    "delivery failed"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::Section;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct FailingChannel;

    #[async_trait]
    impl DeliveryChannel for FailingChannel {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn deliver(
            &self,
            _payload: &NotificationPayload,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            Err(DeliveryError::Rejected("always down".to_string()))
        }
    }

    struct CountingChannel {
        calls: Arc<Mutex<u32>>,
    }

    #[async_trait]
    impl DeliveryChannel for CountingChannel {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn deliver(
            &self,
            _payload: &NotificationPayload,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            *self.calls.lock().unwrap() += 1;
            Ok(DeliveryReceipt {
                channel: self.name(),
                detail: "ok".to_string(),
            })
        }
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            subject: "s".to_string(),
            sender: "n@example.com".to_string(),
            recipients: vec!["oncall@example.com".to_string()],
            headers: HashMap::new(),
            sections: vec![Section {
                name: "backtrace".to_string(),
                body: "src/a.rs:1".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_surfaces_channel_failures_without_retrying() {
        let dispatcher = Dispatcher::new(Box::new(FailingChannel));
        let err = dispatcher.deliver(&payload()).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_delivers_exactly_once_per_call() {
        let calls = Arc::new(Mutex::new(0));
        let dispatcher = Dispatcher::new(Box::new(CountingChannel {
            calls: Arc::clone(&calls),
        }));

        dispatcher.deliver(&payload()).await.unwrap();
        dispatcher.deliver(&payload()).await.unwrap();

        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_from_config_builds_log_channel() {
        let dispatcher = Dispatcher::from_config(&ChannelConfig::Log).unwrap();
        let receipt = dispatcher.deliver(&payload()).await.unwrap();
        assert_eq!(receipt.channel, "log");
    }
}
