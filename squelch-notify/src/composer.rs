//! Payload composition
//!
//! Once the throttle admits an occurrence, the composer turns it into the
//! outbound [`NotificationPayload`]: the subject, resolved recipients,
//! custom headers, and a list of named text sections. Which sections are
//! rendered depends on whether the occurrence came from an interactive
//! request or a background context; extra caller data renders as its own
//! sections. The composer only builds the in-memory payload — sending is
//! the dispatcher's job, and rendering stays plain text by design.

use serde::Serialize;

use crate::config::NotifyConfig;
use crate::occurrence::Occurrence;

/// One named block of payload text
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub body: String,
}

/// The composed outbound notification
///
/// Ephemeral: constructed fresh per admitted event and owned solely by the
/// dispatcher call that consumes it.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPayload {
    pub subject: String,
    pub sender: String,
    pub recipients: Vec<String>,
    pub headers: std::collections::HashMap<String, String>,
    pub sections: Vec<Section>,
}

impl NotificationPayload {
    /// Plain-text body: every section under a `== name ==` heading
    pub fn body(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("== {} ==\n{}\n", section.name, section.body));
        }
        out
    }
}

/// Build the payload for an admitted occurrence
///
/// `frames` is the already-filtered backtrace (the same frames persisted in
/// the throttle record).
pub fn compose_payload(
    occurrence: &Occurrence,
    subject: &str,
    frames: &[String],
    config: &NotifyConfig,
) -> NotificationPayload {
    let mut section_names = if occurrence.is_interactive() {
        config.sections.clone()
    } else {
        config.background_sections.clone()
    };

    if !occurrence.data.is_empty() && !section_names.iter().any(|s| s == "data") {
        section_names.push("data".to_string());
    }

    let sections = section_names
        .iter()
        .filter_map(|name| render_section(name, occurrence, frames))
        .collect();

    NotificationPayload {
        subject: subject.to_string(),
        sender: config.sender.clone(),
        recipients: config.recipients.resolve(),
        headers: config.headers.clone(),
        sections,
    }
}

fn render_section(name: &str, occurrence: &Occurrence, frames: &[String]) -> Option<Section> {
    let body = match name {
        "request" => occurrence.request.as_ref().map(render_request)?,
        "session" => occurrence
            .request
            .as_ref()
            .map(|ctx| render_kv(&ctx.session))?,
        "environment" => occurrence
            .request
            .as_ref()
            .map(|ctx| render_kv(&ctx.environment))?,
        "backtrace" => frames.join("\n"),
        "data" => render_data(occurrence),
        other => match occurrence.data.get(other) {
            Some(value) => render_value(value),
            None => {
                tracing::debug!(section = other, "no content for configured section");
                return None;
            }
        },
    };

    if body.is_empty() {
        return None;
    }

    Some(Section {
        name: name.to_string(),
        body,
    })
}

fn render_request(ctx: &crate::occurrence::RequestContext) -> String {
    let mut lines = Vec::new();
    if let Some(label) = ctx.correlation_label() {
        lines.push(format!("handler: {label}"));
    }
    if let (Some(method), Some(url)) = (&ctx.method, &ctx.url) {
        lines.push(format!("{method} {url}"));
    } else if let Some(url) = &ctx.url {
        lines.push(url.clone());
    }
    if let Some(addr) = &ctx.remote_addr {
        lines.push(format!("from: {addr}"));
    }
    lines.join("\n")
}

fn render_kv(map: &std::collections::HashMap<String, String>) -> String {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(key, _)| key.as_str());
    entries
        .into_iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_data(occurrence: &Occurrence) -> String {
    let mut entries: Vec<_> = occurrence.data.iter().collect();
    entries.sort_by_key(|(key, _)| key.as_str());
    entries
        .into_iter()
        .map(|(key, value)| format!("{key}: {}", render_value(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
