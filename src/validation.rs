//! Structural validation of ingestion payloads.
//!
//! Envelope and reading contracts are both expressed as static rule tables
//! evaluated by [`apply_rules`]. Every rule in a table runs, so a rejected
//! object reports all of its defects at once, in table order. Keys that no
//! rule mentions are ignored.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
    whole_number, Quality, Reading, TelemetryBatchEnvelope, ValueType, ENVELOPE_SCHEMA,
};

// ---

/// A single defect, keyed by the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every defect found on one object. Never empty.
///
/// Displays as `path: message` entries joined with `"; "`, which is the
/// message format reported back for rejected readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{}", join(.0))]
pub struct ValidationErrors(Vec<FieldError>);

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(path, message)])
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---

#[derive(Debug, Clone, Copy)]
enum Presence {
    Required,
    /// Absent passes; a present key (including `null`) must satisfy the check.
    Optional,
}

#[derive(Debug, Clone, Copy)]
enum Check {
    Literal(&'static str),
    NonEmptyString,
    Timestamp,
    NonNegativeInt,
    OneOf(&'static [&'static str]),
    AnyString,
    NonEmptyArray,
}

impl Check {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Check::Literal(tag) => value.as_str() == Some(tag),
            Check::NonEmptyString => value.as_str().is_some_and(|s| !s.trim().is_empty()),
            Check::Timestamp => value
                .as_str()
                .is_some_and(|s| !s.trim().is_empty() && DateTime::parse_from_rfc3339(s).is_ok()),
            Check::NonNegativeInt => matches!(value, Value::Number(n) if whole_number(n).is_some()),
            Check::OneOf(tags) => value.as_str().is_some_and(|s| tags.contains(&s)),
            Check::AnyString => value.is_string(),
            Check::NonEmptyArray => value.as_array().is_some_and(|items| !items.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    path: &'static str,
    presence: Presence,
    check: Check,
    message: &'static str,
}

impl FieldRule {
    const fn required(path: &'static str, check: Check, message: &'static str) -> Self {
        Self {
            path,
            presence: Presence::Required,
            check,
            message,
        }
    }

    const fn optional(path: &'static str, check: Check, message: &'static str) -> Self {
        Self {
            path,
            presence: Presence::Optional,
            check,
            message,
        }
    }

    fn is_satisfied_by(&self, object: &Map<String, Value>) -> bool {
        match (object.get(self.path), self.presence) {
            (None, Presence::Optional) => true,
            (None, Presence::Required) => false,
            (Some(value), _) => self.check.accepts(value),
        }
    }
}

const ENVELOPE_RULES: &[FieldRule] = &[
    FieldRule::required("schema", Check::Literal(ENVELOPE_SCHEMA), "schema must be measurements.v1"),
    FieldRule::required("device_id", Check::NonEmptyString, "device_id is required"),
    FieldRule::required("sent_at", Check::Timestamp, "sent_at must be RFC3339 string"),
    FieldRule::optional("seq", Check::NonNegativeInt, "seq must be a non-negative integer"),
    FieldRule::required("readings", Check::NonEmptyArray, "readings must be a non-empty array"),
];

const READING_RULES: &[FieldRule] = &[
    FieldRule::required("ts", Check::Timestamp, "ts must be RFC3339 string"),
    FieldRule::required("sensor_key", Check::NonEmptyString, "sensor_key is required"),
    FieldRule::required("metric", Check::NonEmptyString, "metric is required"),
    FieldRule::required("unit", Check::NonEmptyString, "unit is required"),
    FieldRule::optional("value_type", Check::OneOf(ValueType::TAGS), "invalid value_type"),
    FieldRule::optional(
        "window_ms",
        Check::NonNegativeInt,
        "window_ms must be a non-negative integer",
    ),
    FieldRule::optional("quality", Check::OneOf(Quality::TAGS), "quality must be ok|suspect|error"),
    FieldRule::optional("error_code", Check::AnyString, "error_code must be a string"),
];

/// Run a rule table against `value`, returning the object on success.
fn apply_rules<'a>(
    value: &'a Value,
    rules: &[FieldRule],
) -> Result<&'a Map<String, Value>, ValidationErrors> {
    // ---
    let Some(object) = value.as_object() else {
        return Err(ValidationErrors::single("", "Expected object"));
    };

    let errors: Vec<FieldError> = rules
        .iter()
        .filter(|rule| !rule.is_satisfied_by(object))
        .map(|rule| FieldError::new(rule.path, rule.message))
        .collect();

    if errors.is_empty() {
        Ok(object)
    } else {
        Err(ValidationErrors(errors))
    }
}

fn decode<T: DeserializeOwned>(object: &Map<String, Value>) -> Result<T, ValidationErrors> {
    serde_json::from_value(Value::Object(object.clone()))
        .map_err(|e| ValidationErrors::single("", e.to_string()))
}

/// Validate the batch wrapper. Reading elements are not inspected.
pub fn validate_envelope(value: &Value) -> Result<TelemetryBatchEnvelope, ValidationErrors> {
    apply_rules(value, ENVELOPE_RULES).and_then(decode)
}

/// Validate a single reading in isolation.
pub fn validate_reading(value: &Value) -> Result<Reading, ValidationErrors> {
    apply_rules(value, READING_RULES).and_then(decode)
}
