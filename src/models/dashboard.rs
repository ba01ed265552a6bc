// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard screen (`DashboardScreen`).
//!
//! The dashboard wraps its live values in a `liveData` field that holds a
//! JSON document encoded as a string. Water temperature lives in there.

use super::{field, lenient_f64, MalformedResponse};
use serde_json::Value;

const RESOURCE: &str = "DashboardScreen";

/// Extract water temperature (°C) from a dashboard body.
///
/// `Ok(None)` when the dashboard carries no temperature at all.
pub fn temperature_from_response(body: &Value) -> Result<Option<f64>, MalformedResponse> {
    let obj = body
        .as_object()
        .ok_or_else(|| MalformedResponse::new(RESOURCE, "body is not an object"))?;

    let live = match field(obj, &["liveData", "live_data"]) {
        None => return Ok(None),
        Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded).map_err(|e| {
            MalformedResponse::new(RESOURCE, format!("liveData does not decode: {}", e))
        })?,
        // Some firmware sends it already decoded.
        Some(Value::Object(decoded)) => Value::Object(decoded.clone()),
        Some(other) => {
            return Err(MalformedResponse::new(
                RESOURCE,
                format!("liveData has unexpected type: {}", other),
            ))
        }
    };

    let live = live
        .as_object()
        .ok_or_else(|| MalformedResponse::new(RESOURCE, "liveData is not an object"))?;

    match field(live, &["temperature", "temp", "waterTemperature"]) {
        None => Ok(None),
        Some(value) => lenient_f64(value).map(Some).ok_or_else(|| {
            MalformedResponse::new(RESOURCE, format!("temperature is not numeric: {}", value))
        }),
    }
}
