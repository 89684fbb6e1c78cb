//! Layered notification configuration
//!
//! Configuration resolves from three layers with documented precedence:
//! per-call overrides > environment overlay > built-in defaults. The host
//! sets the defaults and the environment overlay once at startup;
//! [`Options`] is the partial overlay applied per `notify` call. Resolution
//! happens once per call and the resolved [`NotifyConfig`] is read-only
//! from there on.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use squelch::core::backtrace::DEFAULT_FILTER_PATTERNS;

const DEFAULT_SENDER: &str = "\"Error Notifier\" <error.notifier@example.com>";
const DEFAULT_PREFIX: &str = "[ERROR] ";
const DEFAULT_COUNT_LIMIT: u32 = 5;
const DEFAULT_WINDOW: Duration = Duration::from_secs(30 * 60);

/// Recipient list, static or resolved at delivery time
#[derive(Clone)]
pub enum Recipients {
    /// Fixed list of addresses
    List(Vec<String>),
    /// Callable consulted on every delivery (e.g. an on-call rota lookup)
    Resolver(Arc<dyn Fn() -> Vec<String> + Send + Sync>),
}

impl Recipients {
    pub fn list<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Recipients::List(addresses.into_iter().map(Into::into).collect())
    }

    pub fn resolver(f: impl Fn() -> Vec<String> + Send + Sync + 'static) -> Self {
        Recipients::Resolver(Arc::new(f))
    }

    /// Materialize the recipient addresses for one delivery
    pub fn resolve(&self) -> Vec<String> {
        match self {
            Recipients::List(addresses) => addresses.clone(),
            Recipients::Resolver(f) => f(),
        }
    }
}

impl Default for Recipients {
    fn default() -> Self {
        Recipients::List(Vec::new())
    }
}

impl fmt::Debug for Recipients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipients::List(addresses) => f.debug_tuple("List").field(addresses).finish(),
            Recipients::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Name announced in the EHLO greeting
    pub hello_name: String,
    pub connect_timeout: Duration,
    /// Bound on each command/response exchange
    pub command_timeout: Duration,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        SmtpConfig {
            host: "127.0.0.1".to_string(),
            port: 25,
            hello_name: "localhost".to_string(),
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(10),
        }
    }
}

/// Webhook endpoint settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookConfig {
    pub url: String,
    /// Extra request headers
    pub headers: HashMap<String, String>,
    pub request_timeout: Duration,
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        WebhookConfig {
            url: url.into(),
            headers: HashMap::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Which delivery channel to dispatch through
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelConfig {
    Smtp(SmtpConfig),
    Webhook(WebhookConfig),
    /// Emit through tracing; useful for tests and dry runs
    Log,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig::Log
    }
}

/// Fully resolved notification configuration
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Sender address for mail-like channels
    pub sender: String,
    pub recipients: Recipients,
    /// Subject prefix
    pub prefix: String,
    /// Sections rendered for interactive (request) occurrences
    pub sections: Vec<String>,
    /// Sections rendered for background occurrences
    pub background_sections: Vec<String>,
    /// Include the quoted error message in the subject
    pub verbose_subject: bool,
    /// Replace digit runs in the subject (and thus the fingerprint)
    pub normalize_subject: bool,
    /// Include `controller#action` in the subject when known
    pub include_controller_and_action_names_in_subject: bool,
    /// Caller-supplied accumulated-error annotation for the subject
    pub accumulated_errors_count: Option<u32>,
    /// Admitted notifications per window
    pub count_limit: u32,
    /// Quiet time before the counter resets
    pub window: Duration,
    /// Custom headers attached to the payload
    pub headers: HashMap<String, String>,
    /// Delivery channel
    pub channel: ChannelConfig,
    /// Substring patterns for dropping runtime/harness stack frames
    pub backtrace_filter_patterns: Vec<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        NotifyConfig {
            sender: DEFAULT_SENDER.to_string(),
            recipients: Recipients::default(),
            prefix: DEFAULT_PREFIX.to_string(),
            sections: vec![
                "request".to_string(),
                "session".to_string(),
                "environment".to_string(),
                "backtrace".to_string(),
            ],
            background_sections: vec!["backtrace".to_string(), "data".to_string()],
            verbose_subject: true,
            normalize_subject: false,
            include_controller_and_action_names_in_subject: true,
            accumulated_errors_count: None,
            count_limit: DEFAULT_COUNT_LIMIT,
            window: DEFAULT_WINDOW,
            headers: HashMap::new(),
            channel: ChannelConfig::default(),
            backtrace_filter_patterns: DEFAULT_FILTER_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl NotifyConfig {
    pub fn builder() -> NotifyConfigBuilder {
        NotifyConfigBuilder {
            config: NotifyConfig::default(),
        }
    }

    /// Apply a partial overlay, producing the resolved configuration
    ///
    /// Fields present in `options` win; everything else keeps this
    /// config's value.
    pub fn overlaid(&self, options: &Options) -> NotifyConfig {
        let mut resolved = self.clone();

        if let Some(sender) = &options.sender {
            resolved.sender = sender.clone();
        }
        if let Some(recipients) = &options.recipients {
            resolved.recipients = recipients.clone();
        }
        if let Some(prefix) = &options.prefix {
            resolved.prefix = prefix.clone();
        }
        if let Some(sections) = &options.sections {
            resolved.sections = sections.clone();
        }
        if let Some(background_sections) = &options.background_sections {
            resolved.background_sections = background_sections.clone();
        }
        if let Some(verbose_subject) = options.verbose_subject {
            resolved.verbose_subject = verbose_subject;
        }
        if let Some(normalize_subject) = options.normalize_subject {
            resolved.normalize_subject = normalize_subject;
        }
        if let Some(include) = options.include_controller_and_action_names_in_subject {
            resolved.include_controller_and_action_names_in_subject = include;
        }
        if let Some(count) = options.accumulated_errors_count {
            resolved.accumulated_errors_count = Some(count);
        }
        if let Some(count_limit) = options.count_limit {
            resolved.count_limit = count_limit;
        }
        if let Some(window) = options.window {
            resolved.window = window;
        }
        if let Some(headers) = &options.headers {
            resolved.headers = headers.clone();
        }
        if let Some(channel) = &options.channel {
            resolved.channel = channel.clone();
        }
        if let Some(patterns) = &options.backtrace_filter_patterns {
            resolved.backtrace_filter_patterns = patterns.clone();
        }

        resolved
    }
}

/// Builder for the base [`NotifyConfig`]
pub struct NotifyConfigBuilder {
    config: NotifyConfig,
}

impl NotifyConfigBuilder {
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.config.sender = sender.into();
        self
    }

    pub fn recipients(mut self, recipients: Recipients) -> Self {
        self.config.recipients = recipients;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = prefix.into();
        self
    }

    pub fn sections(mut self, sections: Vec<String>) -> Self {
        self.config.sections = sections;
        self
    }

    pub fn background_sections(mut self, sections: Vec<String>) -> Self {
        self.config.background_sections = sections;
        self
    }

    pub fn verbose_subject(mut self, verbose: bool) -> Self {
        self.config.verbose_subject = verbose;
        self
    }

    pub fn normalize_subject(mut self, normalize: bool) -> Self {
        self.config.normalize_subject = normalize;
        self
    }

    pub fn include_controller_and_action_names_in_subject(mut self, include: bool) -> Self {
        self.config.include_controller_and_action_names_in_subject = include;
        self
    }

    pub fn count_limit(mut self, count_limit: u32) -> Self {
        self.config.count_limit = count_limit;
        self
    }

    pub fn window(mut self, window: Duration) -> Self {
        self.config.window = window;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(key.into(), value.into());
        self
    }

    pub fn channel(mut self, channel: ChannelConfig) -> Self {
        self.config.channel = channel;
        self
    }

    pub fn backtrace_filter_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.backtrace_filter_patterns = patterns;
        self
    }

    pub fn build(self) -> NotifyConfig {
        self.config
    }
}

/// Partial configuration overlay
///
/// Every field is optional; `None` means "inherit from the layer below".
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub sender: Option<String>,
    pub recipients: Option<Recipients>,
    pub prefix: Option<String>,
    pub sections: Option<Vec<String>>,
    pub background_sections: Option<Vec<String>>,
    pub verbose_subject: Option<bool>,
    pub normalize_subject: Option<bool>,
    pub include_controller_and_action_names_in_subject: Option<bool>,
    pub accumulated_errors_count: Option<u32>,
    pub count_limit: Option<u32>,
    pub window: Option<Duration>,
    pub headers: Option<HashMap<String, String>>,
    pub channel: Option<ChannelConfig>,
    pub backtrace_filter_patterns: Option<Vec<String>>,
}
