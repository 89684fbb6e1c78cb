//! HTTP webhook delivery channel
//!
//! Posts the payload as JSON to a configured endpoint. Custom headers come
//! from the channel configuration; a non-2xx status surfaces as
//! [`DeliveryError::Rejected`]. There is no retry here — gateways and
//! queues on the receiving side own that policy.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{DeliveryChannel, DeliveryError, DeliveryReceipt};
use crate::composer::NotificationPayload;
use crate::config::WebhookConfig;

/// JSON POST delivery to an HTTP endpoint
pub struct WebhookChannel {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(WebhookChannel { config, client })
    }

    fn header_map(&self) -> Result<HeaderMap, DeliveryError> {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|err| DeliveryError::Config(format!("invalid header name {key}: {err}")))?;
            let value = HeaderValue::from_str(value).map_err(|err| {
                DeliveryError::Config(format!("invalid header value for {key}: {err}"))
            })?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl DeliveryChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let headers = self.header_map()?;

        let response = self
            .client
            .post(&self.config.url)
            .headers(headers)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected(format!(
                "webhook answered {status}"
            )));
        }

        tracing::info!(url = %self.config.url, %status, "notification delivered via webhook");

        Ok(DeliveryReceipt {
            channel: self.name(),
            detail: status.to_string(),
        })
    }
}
