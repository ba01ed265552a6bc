// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the chlorinator bridge.
//!
//! Upstream bodies are decoded leniently: the INSNRG API is not versioned
//! and has been observed to send numbers as strings and booleans as 0/1.

pub mod chemistry;
pub mod credentials;
pub mod dashboard;
pub mod reading;
pub mod snapshot;
pub mod timer;

pub use chemistry::ChemistryReading;
pub use credentials::{CredentialSet, Expiry};
pub use reading::{Quantity, Reading, ReadingStatus, ReadingValue, Thresholds};
pub use snapshot::{ChemistrySource, Snapshot};
pub use timer::TimerEntry;

use serde_json::{Map, Value};

/// A 2xx upstream body that did not have the expected shape.
///
/// Always recovered by the caller (empty or absent values), never surfaced
/// as a failed refresh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Malformed {resource} response: {reason}")]
pub struct MalformedResponse {
    pub resource: &'static str,
    pub reason: String,
}

impl MalformedResponse {
    pub(crate) fn new(resource: &'static str, reason: impl Into<String>) -> Self {
        Self {
            resource,
            reason: reason.into(),
        }
    }
}

/// First present, non-null value among `keys`.
pub(crate) fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Number, or a string holding a number.
pub(crate) fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Bool, 0/1, or "true"/"false"/"1"/"0".
pub(crate) fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Some(true),
            "false" | "0" | "off" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// String, or a number rendered as text.
pub(crate) fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
