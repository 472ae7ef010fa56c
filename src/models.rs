//! Data models for telemetry ingestion.
//!
//! These are the typed forms of the ingestion payload. They are only ever
//! built from JSON that has already passed the rule tables in
//! [`crate::validation`]; unknown keys are kept in `extra` so that nothing a
//! station sends is silently dropped.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

// ---

/// Literal tag identifying the only supported envelope version.
pub const ENVELOPE_SCHEMA: &str = "measurements.v1";

/// A JSON number that is a non-negative whole value, as `u64`.
///
/// `60000.0` counts as whole. Values past `u64::MAX` saturate.
pub fn whole_number(n: &Number) -> Option<u64> {
    n.as_u64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

fn optional_whole_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Number>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) => whole_number(&n)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("{} is not a non-negative integer", n))),
    }
}

/// Declared type of a reading's `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Bool,
    String,
    Object,
}

impl ValueType {
    pub const TAGS: &'static [&'static str] = &["number", "bool", "string", "object"];
}

/// Sensor-reported quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Ok,
    Suspect,
    Error,
}

impl Quality {
    pub const TAGS: &'static [&'static str] = &["ok", "suspect", "error"];
}

/// One sensor observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub ts: DateTime<Utc>,
    pub sensor_key: String,
    pub metric: String,
    pub unit: String,

    /// Accepted as-is; a missing value reads as `null`.
    #[serde(default)]
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,

    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub window_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One ingestion submission from a station.
///
/// `readings` stays untyped here: each element is validated on its own by
/// the batch processor so one bad reading cannot sink its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBatchEnvelope {
    // ---
    pub schema: String,
    pub device_id: String,
    pub sent_at: DateTime<Utc>,

    /// Advisory sequence counter. Not checked for ordering or duplicates.
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub seq: Option<u64>,

    /// Firmware descriptor (`name`, optional `version`), passed through.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fw: Option<Value>,

    pub readings: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
