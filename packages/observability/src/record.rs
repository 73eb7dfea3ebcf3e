//! Structured log record.
//!
//! Wire shape consumed by log ingestion:
//! - level (EMERG .. DEBUG)
//! - timestamp (ISO-8601, UTC, millisecond precision)
//! - env (deployment environment)
//! - bindings from the logger chain (path, requestHeaders, trace_id, ...)
//! - per-call fields (durationInMs, error_code, ...)
//! - message

use crate::{Environment, LogLevel};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Key/value payload attached to a logger or a single record.
pub type Fields = Map<String, Value>;

/// Keys owned by the record itself; bindings and fields may not shadow them.
pub(crate) const RESERVED_KEYS: [&str; 4] = ["level", "timestamp", "env", "message"];

/// A single emitted log record. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    level: LogLevel,
    #[serde(serialize_with = "serialize_timestamp")]
    timestamp: DateTime<Utc>,
    env: Environment,
    #[serde(flatten)]
    bindings: Fields,
    #[serde(flatten)]
    fields: Fields,
    message: String,
}

impl LogRecord {
    /// Build a record. Per-record fields win over logger bindings with the
    /// same key, and neither may overwrite the reserved keys.
    pub fn new(
        level: LogLevel,
        env: Environment,
        bindings: &Fields,
        mut fields: Fields,
        message: String,
    ) -> Self {
        for key in RESERVED_KEYS {
            fields.remove(key);
        }
        let bindings = bindings
            .iter()
            .filter(|(k, _)| !fields.contains_key(*k) && !RESERVED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Self {
            level,
            timestamp: Utc::now(),
            env,
            bindings,
            fields,
            message,
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn env(&self) -> Environment {
        self.env
    }

    pub fn bindings(&self) -> &Fields {
        &self.bindings
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Look a key up in fields, then bindings.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).or_else(|| self.bindings.get(key))
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_json(&self) -> String {
        // Every component is a string, a map of JSON values or a plain enum.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Record as a JSON object value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Turn a caller-supplied value into record fields.
///
/// Objects are used as-is, `null` means no fields, anything else is kept
/// under `value`.
pub fn into_fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        Value::Null => Fields::new(),
        other => {
            let mut map = Fields::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
