//! Conversation export flattening
//!
//! Chat exports store each conversation as a `mapping` of node id to node,
//! a tree whose key order carries no meaning. Messages are recovered from the
//! nodes and ordered by their creation time so the rendered transcript reads
//! top to bottom regardless of how the exporter ordered the keys.

use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::Write;

/// Title used when a conversation has none
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// One timestamped utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptMessage {
    /// Creation time, seconds since the epoch
    pub timestamp: f64,
    /// Author role as exported (`user`, `assistant`, `system`, ...)
    pub role: String,
    /// Concatenated string parts
    pub text: String,
}

/// A titled, chronologically ordered conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// Conversation title
    pub title: String,
    /// Messages, oldest first
    pub messages: Vec<TranscriptMessage>,
}

/// Whether `value` looks like a conversation export: a non-empty array whose
/// first element carries a `mapping`.
pub fn is_export(value: &Value) -> bool {
    value
        .as_array()
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .is_some_and(|first| first.contains_key("mapping"))
}

/// Recover every conversation of an export.
///
/// Elements that are not objects are skipped. Message nodes without a numeric
/// creation time or without any non-blank string content are dropped.
pub fn parse_export(value: &Value) -> Vec<Conversation> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_object)
        .map(|conversation| {
            let title = conversation
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_TITLE)
                .to_string();

            let mut messages: Vec<TranscriptMessage> = conversation
                .get("mapping")
                .and_then(Value::as_object)
                .map(|mapping| mapping.values().filter_map(message_from_node).collect())
                .unwrap_or_default();

            messages.sort_by(chronological);
            Conversation { title, messages }
        })
        .collect()
}

/// Render conversations as `# Conversation: title` blocks of `ROLE: text`
/// lines separated by blank lines.
pub fn render(conversations: &[Conversation]) -> String {
    let mut out = String::new();

    for (index, conversation) in conversations.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "# Conversation: {}\n", conversation.title);
        for message in &conversation.messages {
            let _ = writeln!(out, "{}: {}\n", message.role.to_uppercase(), message.text);
        }
    }

    out
}

/// Parse and render in one step.
pub fn flatten(value: &Value) -> String {
    render(&parse_export(value))
}

fn message_from_node(node: &Value) -> Option<TranscriptMessage> {
    let message = node.get("message")?.as_object()?;
    let timestamp = message.get("create_time")?.as_f64()?;
    let content = message.get("content")?;

    let text: String = content
        .get("parts")
        .and_then(Value::as_array)
        .map(|parts| parts.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return None;
    }

    let role = message
        .get("author")
        .and_then(|author| author.get("role"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    Some(TranscriptMessage {
        timestamp,
        role,
        text,
    })
}

/// Timestamp order; equal timestamps fall back to role and text so the result
/// never depends on map iteration order.
fn chronological(a: &TranscriptMessage, b: &TranscriptMessage) -> Ordering {
    a.timestamp
        .total_cmp(&b.timestamp)
        .then_with(|| a.role.cmp(&b.role))
        .then_with(|| a.text.cmp(&b.text))
}
