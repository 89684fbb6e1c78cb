//! The notifier facade
//!
//! [`ErrorNotifier`] wires the whole pipeline together: option resolution,
//! subject composition, fingerprint derivation, the throttle check, payload
//! composition, and dispatch. Hosts construct one at startup and call
//! [`notify`](ErrorNotifier::notify) per error occurrence.

use std::path::PathBuf;
use std::time::SystemTime;

use crate::actor::{ThrottleActor, ThrottleHandle};
use crate::channel::{DeliveryChannel, DeliveryReceipt};
use crate::composer::compose_payload;
use crate::config::{ChannelConfig, NotifyConfig, Options};
use crate::dispatcher::Dispatcher;
use crate::error::NotifyError;
use crate::occurrence::Occurrence;
use squelch::core::subject::{self, SubjectOptions};
use squelch::{BacktraceFilter, FileStore, Fingerprint, MemoryStore, ThrottleLimits, ThrottleRecord};

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// How one occurrence was resolved
#[derive(Debug, Clone)]
pub enum NotifyOutcome {
    /// The occurrence was admitted and the payload was transmitted
    Delivered {
        receipt: DeliveryReceipt,
        /// Occurrences recorded in the current window, this one included
        count: u32,
    },
    /// The throttle denied the occurrence; nothing was sent
    ///
    /// This is a normal outcome, not a failure.
    Suppressed {
        /// Occurrences recorded in the current window, this one included
        count: u32,
    },
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered { .. })
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, NotifyOutcome::Suppressed { .. })
    }

    /// In-window occurrence count at the time of this outcome
    pub fn count(&self) -> u32 {
        match self {
            NotifyOutcome::Delivered { count, .. } | NotifyOutcome::Suppressed { count } => *count,
        }
    }
}

/// Decides, composes, and dispatches error notifications
pub struct ErrorNotifier {
    defaults: NotifyConfig,
    environment: Options,
    throttle: ThrottleHandle,
    dispatcher: Dispatcher,
    base_channel: ChannelConfig,
    has_custom_channel: bool,
}

impl ErrorNotifier {
    pub fn builder() -> ErrorNotifierBuilder {
        ErrorNotifierBuilder {
            config: NotifyConfig::default(),
            environment: Options::default(),
            store_root: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            custom_channel: None,
        }
    }

    /// Handle one error occurrence
    ///
    /// Resolution order for configuration is per-call `overrides` over the
    /// environment overlay over the defaults. The throttle decision is
    /// fail closed: a storage failure returns
    /// [`NotifyError::Storage`] and nothing is sent.
    pub async fn notify(
        &self,
        occurrence: &Occurrence,
        overrides: &Options,
    ) -> Result<NotifyOutcome, NotifyError> {
        let config = self.defaults.overlaid(&self.environment).overlaid(overrides);

        let filter = BacktraceFilter::new(config.backtrace_filter_patterns.clone());
        let frames = filter.filter(&occurrence.backtrace);

        let correlation = if config.include_controller_and_action_names_in_subject {
            occurrence
                .request
                .as_ref()
                .and_then(|request| request.correlation_label())
        } else {
            None
        };

        let subject = subject::compose(
            &occurrence.kind,
            &occurrence.message,
            &SubjectOptions {
                prefix: config.prefix.clone(),
                accumulated_errors_count: config.accumulated_errors_count,
                correlation,
                verbose: config.verbose_subject,
                normalize_digits: config.normalize_subject,
            },
        );

        let fingerprint = Fingerprint::from_subject(&subject);
        let seed = ThrottleRecord::new(subject.clone(), frames.clone());
        let limits = ThrottleLimits {
            count_limit: config.count_limit,
            window: config.window,
        };

        let outcome = self
            .throttle
            .check(fingerprint.clone(), seed, limits, SystemTime::now())
            .await?;

        if !outcome.admitted {
            tracing::info!(
                fingerprint = %fingerprint,
                count = outcome.count,
                "notification suppressed"
            );
            return Ok(NotifyOutcome::Suppressed {
                count: outcome.count,
            });
        }

        let payload = compose_payload(occurrence, &subject, &frames, &config);

        // A per-call channel override gets its own dispatcher; the common
        // path reuses the one built at startup
        let receipt = if !self.has_custom_channel && config.channel != self.base_channel {
            Dispatcher::from_config(&config.channel)?
                .deliver(&payload)
                .await?
        } else {
            self.dispatcher.deliver(&payload).await?
        };

        Ok(NotifyOutcome::Delivered {
            receipt,
            count: outcome.count,
        })
    }
}

/// Builder for [`ErrorNotifier`]
///
/// Must be built inside a tokio runtime; building spawns the throttle
/// actor task.
pub struct ErrorNotifierBuilder {
    config: NotifyConfig,
    environment: Options,
    store_root: Option<PathBuf>,
    buffer_size: usize,
    custom_channel: Option<Box<dyn DeliveryChannel>>,
}

impl ErrorNotifierBuilder {
    /// Base configuration (defaults layer)
    pub fn config(mut self, config: NotifyConfig) -> Self {
        self.config = config;
        self
    }

    /// Environment overlay applied over the defaults on every call
    pub fn environment(mut self, environment: Options) -> Self {
        self.environment = environment;
        self
    }

    /// Storage root for the durable throttle state
    ///
    /// Without a root the notifier falls back to an in-memory store and
    /// throttle state is lost on restart.
    pub fn store_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.store_root = Some(root.into());
        self
    }

    /// Buffer size of the throttle actor's request channel
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Use a host-provided delivery channel instead of the configured one
    ///
    /// When set, per-call channel overrides are ignored.
    pub fn channel(mut self, channel: Box<dyn DeliveryChannel>) -> Self {
        self.custom_channel = Some(channel);
        self
    }

    pub fn build(self) -> Result<ErrorNotifier, NotifyError> {
        let base = self.config.overlaid(&self.environment);
        let base_channel = base.channel.clone();

        let has_custom_channel = self.custom_channel.is_some();
        let dispatcher = match self.custom_channel {
            Some(channel) => Dispatcher::new(channel),
            None => Dispatcher::from_config(&base_channel)?,
        };

        let throttle = match &self.store_root {
            Some(root) => ThrottleActor::spawn(self.buffer_size, FileStore::new(root)),
            None => {
                tracing::warn!(
                    "no store root configured; throttle state will not survive restarts"
                );
                ThrottleActor::spawn(self.buffer_size, MemoryStore::new())
            }
        };

        Ok(ErrorNotifier {
            defaults: self.config,
            environment: self.environment,
            throttle,
            dispatcher,
            base_channel,
            has_custom_channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DeliveryError;
    use crate::composer::NotificationPayload;
    use crate::config::Recipients;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct CollectingChannel {
        sent: Arc<Mutex<Vec<NotificationPayload>>>,
    }

    #[async_trait]
    impl DeliveryChannel for CollectingChannel {
        fn name(&self) -> &'static str {
            "collecting"
        }

        async fn deliver(
            &self,
            payload: &NotificationPayload,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.sent.lock().unwrap().push(payload.clone());
            Ok(DeliveryReceipt {
                channel: self.name(),
                detail: "collected".to_string(),
            })
        }
    }

    fn notifier_with_sink(config: NotifyConfig) -> (ErrorNotifier, Arc<Mutex<Vec<NotificationPayload>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let notifier = ErrorNotifier::builder()
            .config(config)
            .channel(Box::new(CollectingChannel {
                sent: Arc::clone(&sent),
            }))
            .build()
            .unwrap();
        (notifier, sent)
    }

    fn config(count_limit: u32) -> NotifyConfig {
        NotifyConfig::builder()
            .recipients(Recipients::list(["oncall@example.com"]))
            .count_limit(count_limit)
            .build()
    }

    #[tokio::test]
    async fn test_admits_then_suppresses() {
        let (notifier, sent) = notifier_with_sink(config(2));
        let occurrence = Occurrence::new("TimeoutError", "boom");

        let first = notifier.notify(&occurrence, &Options::default()).await.unwrap();
        let second = notifier.notify(&occurrence, &Options::default()).await.unwrap();
        let third = notifier.notify(&occurrence, &Options::default()).await.unwrap();

        assert!(first.is_delivered());
        assert!(second.is_delivered());
        assert!(third.is_suppressed());
        assert_eq!(third.count(), 2);
        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_different_errors_do_not_share_a_counter() {
        let (notifier, sent) = notifier_with_sink(config(1));

        let timeout = Occurrence::new("TimeoutError", "boom");
        let io = Occurrence::new("IoError", "boom");

        assert!(notifier.notify(&timeout, &Options::default()).await.unwrap().is_delivered());
        assert!(notifier.notify(&timeout, &Options::default()).await.unwrap().is_suppressed());
        assert!(notifier.notify(&io, &Options::default()).await.unwrap().is_delivered());

        assert_eq!(sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_backtrace_still_delivers() {
        let (notifier, sent) = notifier_with_sink(config(5));
        let occurrence = Occurrence::new("PanicError", "no trace available");

        let outcome = notifier.notify(&occurrence, &Options::default()).await.unwrap();
        assert!(outcome.is_delivered());

        let payloads = sent.lock().unwrap();
        assert!(payloads[0].subject.contains("(PanicError)"));
    }

    #[tokio::test]
    async fn test_per_call_override_changes_subject_and_limit() {
        let (notifier, sent) = notifier_with_sink(config(5));
        let occurrence = Occurrence::new("TimeoutError", "boom");

        let overrides = Options {
            prefix: Some("[critical] ".to_string()),
            count_limit: Some(1),
            ..Options::default()
        };

        let first = notifier.notify(&occurrence, &overrides).await.unwrap();
        let second = notifier.notify(&occurrence, &overrides).await.unwrap();

        assert!(first.is_delivered());
        assert!(second.is_suppressed());
        assert!(sent.lock().unwrap()[0].subject.starts_with("[critical] "));
    }

    #[tokio::test]
    async fn test_accumulated_errors_annotation_comes_from_caller() {
        let (notifier, sent) = notifier_with_sink(config(5));
        let occurrence = Occurrence::new("TimeoutError", "boom");

        let overrides = Options {
            accumulated_errors_count: Some(7),
            ..Options::default()
        };
        notifier.notify(&occurrence, &overrides).await.unwrap();

        assert!(sent.lock().unwrap()[0].subject.contains("(7 times)"));
    }

    #[tokio::test]
    async fn test_digit_normalization_groups_variants() {
        let mut config = config(1);
        config.normalize_subject = true;
        let (notifier, sent) = notifier_with_sink(config);

        let a = Occurrence::new("HttpError", "status 502 from worker 3");
        let b = Occurrence::new("HttpError", "status 504 from worker 11");

        assert!(notifier.notify(&a, &Options::default()).await.unwrap().is_delivered());
        // Same fingerprint after normalization, so the second one is throttled
        assert!(notifier.notify(&b, &Options::default()).await.unwrap().is_suppressed());
        assert_eq!(sent.lock().unwrap().len(), 1);
    }
}
