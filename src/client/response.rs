use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::subscriber::SubscriberRecord;

/// Parse a response body. Bodies that are not JSON are kept verbatim under a
/// `raw` key so they can still be shown.
pub fn decode_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

fn error_field(document: &Value) -> Option<String> {
    ["error", "detail"].iter().find_map(|key| match document.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Null) | Some(Value::String(_)) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Message for a non-2xx response: the body's `error` or `detail` field,
/// else the raw body text, else the status line.
pub fn http_error_message(status: StatusCode, document: &Value, text: &str) -> String {
    if let Some(message) = error_field(document) {
        return message;
    }
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// `listSubscriber.subscriberList`, or nothing when the path is missing or
/// not a list.
pub fn subscriber_list(document: &Value) -> &[Value] {
    document
        .get("listSubscriber")
        .and_then(|l| l.get("subscriberList"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn records_from_document(document: &Value) -> Vec<SubscriberRecord> {
    subscriber_list(document)
        .iter()
        .map(SubscriberRecord::from_value)
        .collect()
}

pub fn pretty(document: &Value) -> String {
    serde_json::to_string_pretty(document).unwrap_or_else(|_| document.to_string())
}
