//! Form payload parsing and header-ordered row mapping

use crate::error::IntakeError;
use crate::headers::{HeaderSet, CANONICAL_HEADERS, TIMESTAMP_HEADER};
use crate::types::ResponseRow;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Payload key feeding each non-timestamp canonical header
pub const FIELD_MAP: [(&str, &str); 11] = [
    ("struggle_with_goals", "Struggle with Goals"),
    ("life_change_scale", "Life Change Scale (Coach Tasks)"),
    ("would_achieve_more", "Would Achieve More (Coach)"),
    ("achievement_scale", "Achievement Scale"),
    ("feeling_about_ai", "Feeling about AI Coach"),
    ("email", "Email"),
    ("prolific_pid", "Prolific PID"),
    ("prolific_study_id", "Prolific Study ID"),
    ("prolific_session_id", "Prolific Session ID"),
    ("userAgent", "User Agent"),
    ("ipAddress", "IP Address (if available)"),
];

/// A parsed form submission
///
/// Keys outside [`FIELD_MAP`] are accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormSubmission {
    fields: Map<String, Value>,
}

impl FormSubmission {
    /// Parse a raw request body; anything but a JSON object is rejected
    pub fn from_slice(body: &[u8]) -> Result<Self, IntakeError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| IntakeError::MalformedPayload(e.to_string()))?;
        Self::from_value(value)
    }

    /// Wrap an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, IntakeError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(IntakeError::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Number of top-level keys in the payload
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload was `{}`
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Cell text for a payload key, empty when absent or falsy
    #[must_use]
    pub fn field(&self, key: &str) -> String {
        self.fields.get(key).map(cell_text).unwrap_or_default()
    }

    /// One entry per canonical header, timestamp included
    #[must_use]
    pub fn value_by_header(&self, timestamp: DateTime<Utc>) -> HashMap<&'static str, String> {
        let mut values = HashMap::with_capacity(CANONICAL_HEADERS.len());
        values.insert(TIMESTAMP_HEADER, format_timestamp(timestamp));
        for (key, header) in FIELD_MAP {
            values.insert(header, self.field(key));
        }
        values
    }

    /// Build the row for the given header order
    #[must_use]
    pub fn to_row(&self, headers: &HeaderSet, timestamp: DateTime<Utc>) -> ResponseRow {
        let values = self.value_by_header(timestamp);
        ResponseRow {
            values: headers
                .iter()
                .map(|h| values.get(h).cloned().unwrap_or_default())
                .collect(),
        }
    }
}

/// ISO-8601 UTC with millisecond precision
#[must_use]
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
