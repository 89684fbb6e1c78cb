//! The error occurrence model
//!
//! An [`Occurrence`] is everything the host tells us about one raised
//! error: its type name, message, stack frames, the optional interactive
//! request it happened under, and any extra structured data. Absence of a
//! request context is a normal, first-class state — it selects the
//! background section set when the payload is composed.

use std::collections::HashMap;

/// Correlation context for errors raised while serving a request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Handler grouping label, e.g. a controller or route group name
    pub controller: Option<String>,
    /// Handler action within the group
    pub action: Option<String>,
    /// Request URL
    pub url: Option<String>,
    /// HTTP method
    pub method: Option<String>,
    /// Client address
    pub remote_addr: Option<String>,
    /// Session values worth showing to the operator
    pub session: HashMap<String, String>,
    /// Environment/header values worth showing to the operator
    pub environment: HashMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn session_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }

    pub fn environment_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// `controller#action` label for the subject line, when both are known
    pub fn correlation_label(&self) -> Option<String> {
        match (&self.controller, &self.action) {
            (Some(controller), Some(action)) => Some(format!("{controller}#{action}")),
            _ => None,
        }
    }
}

/// One raised error event
///
/// Malformed input degrades instead of failing: an empty backtrace is
/// fine (the fingerprint falls back to the error kind), and missing
/// request context just selects the background sections.
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// Error type name, e.g. `TimeoutError`
    pub kind: String,
    /// Error message
    pub message: String,
    /// Ordered stack frames, outermost first
    pub backtrace: Vec<String>,
    /// Interactive request this error happened under, if any
    pub request: Option<RequestContext>,
    /// Extra structured context supplied by the caller
    pub data: HashMap<String, serde_json::Value>,
}

impl Occurrence {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Occurrence {
            kind: kind.into(),
            message: message.into(),
            backtrace: Vec::new(),
            request: None,
            data: HashMap::new(),
        }
    }

    /// Build an occurrence from any error value, using its Rust type name
    /// as the kind
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let kind = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error");
        Occurrence::new(kind, err.to_string())
    }

    pub fn with_backtrace(mut self, frames: Vec<String>) -> Self {
        self.backtrace = frames;
        self
    }

    pub fn with_request(mut self, request: RequestContext) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_data_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Whether this occurrence came from an interactive request
    pub fn is_interactive(&self) -> bool {
        self.request.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_label() {
        let ctx = RequestContext::new().controller("orders").action("create");
        assert_eq!(ctx.correlation_label().as_deref(), Some("orders#create"));

        let ctx = RequestContext::new().controller("orders");
        assert_eq!(ctx.correlation_label(), None);
    }

    #[test]
    fn test_from_error_uses_type_name() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let occurrence = Occurrence::from_error(&err);
        assert_eq!(occurrence.kind, "Error");
        assert_eq!(occurrence.message, "disk on fire");
    }

    #[test]
    fn test_builder_surface() {
        let occurrence = Occurrence::new("TimeoutError", "boom")
            .with_backtrace(vec!["src/a.rs:1".to_string()])
            .with_request(RequestContext::new().url("/orders"))
            .with_data_entry("order_id", 42);

        assert!(occurrence.is_interactive());
        assert_eq!(occurrence.backtrace.len(), 1);
        assert_eq!(occurrence.data["order_id"], 42);
    }
}
