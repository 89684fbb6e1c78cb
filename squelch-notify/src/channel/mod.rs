//! Delivery channels
//!
//! A channel is any sink that can accept a composed
//! [`NotificationPayload`]: a mail relay, an HTTP endpoint, a log stream.
//! The dispatcher depends only on the [`DeliveryChannel`] trait, so hosts
//! can plug in their own transports; the built-in ones cover the common
//! cases.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::composer::NotificationPayload;
use crate::config::ChannelConfig;

pub mod log;
pub mod smtp;
pub mod webhook;

pub use log::LogChannel;
pub use smtp::SmtpChannel;
pub use webhook::WebhookChannel;

/// Transport-level delivery failures
///
/// Channels do not retry; policy for retries belongs to the transport the
/// host configured (a relay's queue, an HTTP gateway), not here.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Socket-level failure while talking to the transport
    #[error("I/O error during delivery: {0}")]
    Io(#[from] std::io::Error),

    /// The transport did not answer within the configured bound
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The transport answered and refused the message
    #[error("transport rejected the message: {0}")]
    Rejected(String),

    /// The channel configuration cannot be used as given
    #[error("invalid channel configuration: {0}")]
    Config(String),

    /// HTTP client failure on the webhook path
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Proof of a completed delivery
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    /// Which channel carried the message
    pub channel: &'static str,
    /// Transport-specific detail (SMTP reply, HTTP status, ...)
    pub detail: String,
}

/// A sink capable of transmitting one composed notification
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Short channel identifier for logs and receipts
    fn name(&self) -> &'static str;

    /// Transmit the payload
    ///
    /// Implementations must be timeout-bounded; a `deliver` call may block
    /// on network I/O but never indefinitely.
    async fn deliver(&self, payload: &NotificationPayload)
    -> Result<DeliveryReceipt, DeliveryError>;
}

/// Build the channel described by the configuration
pub fn build_channel(config: &ChannelConfig) -> Result<Box<dyn DeliveryChannel>, DeliveryError> {
    match config {
        ChannelConfig::Smtp(smtp) => Ok(Box::new(SmtpChannel::new(smtp.clone()))),
        ChannelConfig::Webhook(webhook) => Ok(Box::new(WebhookChannel::new(webhook.clone())?)),
        ChannelConfig::Log => Ok(Box::new(LogChannel::new())),
    }
}
