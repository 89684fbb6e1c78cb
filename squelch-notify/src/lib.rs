//! # Squelch Notify
//!
//! Throttled error notifications: decide, compose, deliver.
//!
//! ## Purpose
//!
//! This crate sits between a host application that raises error events and
//! a delivery channel that reaches a human. For every occurrence it:
//!
//! 1. resolves the layered configuration (defaults < environment overlay <
//!    per-call overrides),
//! 2. composes the subject line and derives the throttling fingerprint,
//! 3. asks the durable [`squelch`] throttle whether this occurrence is
//!    still worth a notification,
//! 4. on admit, builds the payload and dispatches it through the
//!    configured channel; on deny, drops the event and reports
//!    [`NotifyOutcome::Suppressed`].
//!
//! Storage failures fail closed: the event is dropped and the error is
//! surfaced, never swallowed — the host should prefer losing one page over
//! crashing or looping.
//!
//! ## Quick Start
//!
//! ```no_run
//! use squelch_notify::{ErrorNotifier, NotifyConfig, Occurrence, Options, Recipients};
//!
//! # async fn run() -> Result<(), squelch_notify::NotifyError> {
//! let config = NotifyConfig::builder()
//!     .recipients(Recipients::list(["oncall@example.com"]))
//!     .prefix("[myapp] ")
//!     .build();
//!
//! let notifier = ErrorNotifier::builder()
//!     .config(config)
//!     .store_root("/var/log/myapp/squelch")
//!     .build()?;
//!
//! let occurrence = Occurrence::new("TimeoutError", "upstream did not respond")
//!     .with_backtrace(vec!["src/client.rs:88".to_string()]);
//!
//! match notifier.notify(&occurrence, &Options::default()).await? {
//!     outcome if outcome.is_delivered() => println!("paged"),
//!     _ => println!("suppressed"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Delivery Channels
//!
//! - SMTP: a minimal mail dialogue against a configured relay
//! - Webhook: a JSON POST to any HTTP endpoint
//! - Log: a tracing sink, useful as a no-op channel in tests
//!
//! All three implement [`DeliveryChannel`]; hosts can plug in their own.

pub mod actor;
pub mod channel;
pub mod composer;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod occurrence;

pub use actor::{ThrottleActor, ThrottleHandle};
pub use channel::{DeliveryChannel, DeliveryError, DeliveryReceipt};
pub use composer::{NotificationPayload, Section, compose_payload};
pub use config::{
    ChannelConfig, NotifyConfig, NotifyConfigBuilder, Options, Recipients, SmtpConfig,
    WebhookConfig,
};
pub use dispatcher::Dispatcher;
pub use error::NotifyError;
pub use notifier::{ErrorNotifier, ErrorNotifierBuilder, NotifyOutcome};
pub use occurrence::{Occurrence, RequestContext};

// The core types flow through this crate's public API; re-export them so
// hosts depend on one crate
pub use squelch::{Fingerprint, ThrottleLimits, ThrottleOutcome, ThrottleRecord};
