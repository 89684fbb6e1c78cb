//! SMTP delivery channel
//!
//! A minimal mail dialogue against a configured relay: EHLO, MAIL, RCPT,
//! DATA, QUIT over a plain TCP connection. Every exchange is bounded by
//! the configured command timeout and any 4xx/5xx reply surfaces as a
//! [`DeliveryError::Rejected`]. Queueing, retries, and the TLS hop to the
//! wider world are the relay's business, not this channel's.
//!
//! # Reply format
//!
//! ```text
//! 250-relay.example.com greets localhost
//! 250-SIZE 35882577
//! 250 SMTPUTF8
//! ```
//!
//! Replies are one or more lines; a dash after the code marks a
//! continuation line and a space marks the last line. Only the final line
//! decides the outcome.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

use super::{DeliveryChannel, DeliveryError, DeliveryReceipt};
use crate::composer::NotificationPayload;
use crate::config::SmtpConfig;

/// SMTP delivery over a configured relay
pub struct SmtpChannel {
    config: SmtpConfig,
}

impl SmtpChannel {
    pub fn new(config: SmtpConfig) -> Self {
        SmtpChannel { config }
    }
}

#[async_trait]
impl DeliveryChannel for SmtpChannel {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        if payload.recipients.is_empty() {
            return Err(DeliveryError::Config(
                "no recipients configured".to_string(),
            ));
        }

        let addr = (self.config.host.as_str(), self.config.port);
        let stream = timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| DeliveryError::Timeout(self.config.connect_timeout))??;

        let (read_half, write_half) = stream.into_split();
        let mut dialogue = Dialogue {
            reader: BufReader::new(read_half).lines(),
            writer: write_half,
            command_timeout: self.config.command_timeout,
        };

        dialogue.expect(&[220]).await?;
        dialogue
            .send(&format!("EHLO {}", self.config.hello_name))
            .await?;
        dialogue.expect(&[250]).await?;

        dialogue
            .send(&format!("MAIL FROM:<{}>", bare_address(&payload.sender)))
            .await?;
        dialogue.expect(&[250]).await?;

        for recipient in &payload.recipients {
            dialogue
                .send(&format!("RCPT TO:<{}>", bare_address(recipient)))
                .await?;
            dialogue.expect(&[250, 251]).await?;
        }

        dialogue.send("DATA").await?;
        dialogue.expect(&[354]).await?;

        dialogue.write_raw(&render_message(payload)).await?;
        dialogue.write_raw("\r\n.\r\n").await?;
        let accepted = dialogue.expect(&[250]).await?;

        // Best-effort goodbye; the message is already accepted
        if dialogue.send("QUIT").await.is_ok() {
            let _ = dialogue.expect(&[221]).await;
        }

        tracing::info!(
            relay = %self.config.host,
            recipients = payload.recipients.len(),
            "notification delivered via smtp"
        );

        Ok(DeliveryReceipt {
            channel: self.name(),
            detail: accepted,
        })
    }
}

struct Dialogue {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    command_timeout: Duration,
}

impl Dialogue {
    async fn send(&mut self, command: &str) -> Result<(), DeliveryError> {
        self.write_raw(&format!("{command}\r\n")).await
    }

    async fn write_raw(&mut self, raw: &str) -> Result<(), DeliveryError> {
        timeout(self.command_timeout, async {
            self.writer.write_all(raw.as_bytes()).await?;
            self.writer.flush().await
        })
        .await
        .map_err(|_| DeliveryError::Timeout(self.command_timeout))?
        .map_err(DeliveryError::Io)
    }

    /// Read one full reply and require its code to be in `accept`
    async fn expect(&mut self, accept: &[u16]) -> Result<String, DeliveryError> {
        let reply = timeout(self.command_timeout, self.read_reply())
            .await
            .map_err(|_| DeliveryError::Timeout(self.command_timeout))??;

        let code = reply
            .get(..3)
            .and_then(|digits| digits.parse::<u16>().ok())
            .ok_or_else(|| DeliveryError::Rejected(format!("unparseable reply: {reply}")))?;

        if accept.contains(&code) {
            Ok(reply)
        } else {
            Err(DeliveryError::Rejected(reply))
        }
    }

    async fn read_reply(&mut self) -> Result<String, DeliveryError> {
        loop {
            let line = self
                .reader
                .next_line()
                .await?
                .ok_or_else(|| DeliveryError::Rejected("connection closed mid-reply".into()))?;

            // "250-..." continues the reply, "250 ..." (or a bare code)
            // finishes it
            if line.len() < 4 || line.as_bytes()[3] != b'-' {
                return Ok(line);
            }
        }
    }
}

/// Extract `addr` from `"Display Name" <addr>`, passing bare addresses through
fn bare_address(sender: &str) -> &str {
    match (sender.rfind('<'), sender.rfind('>')) {
        (Some(open), Some(close)) if open < close => &sender[open + 1..close],
        _ => sender.trim(),
    }
}

fn render_message(payload: &NotificationPayload) -> String {
    let mut message = String::new();
    message.push_str(&format!("From: {}\r\n", payload.sender));
    message.push_str(&format!("To: {}\r\n", payload.recipients.join(", ")));
    message.push_str(&format!("Subject: {}\r\n", payload.subject));

    let mut headers: Vec<_> = payload.headers.iter().collect();
    headers.sort_by_key(|(key, _)| key.as_str());
    for (key, value) in headers {
        message.push_str(&format!("{key}: {value}\r\n"));
    }
    message.push_str("\r\n");

    for line in payload.body().lines() {
        // Dot-stuffing keeps a body line of "." from ending DATA early
        if line.starts_with('.') {
            message.push('.');
        }
        message.push_str(line);
        message.push_str("\r\n");
    }

    message
}
