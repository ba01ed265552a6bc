// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pump/chlorinator timer schedule (`SetTimerAppliance`).

use super::{field, lenient_bool, lenient_f64, lenient_string, MalformedResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const RESOURCE: &str = "SetTimerAppliance";

/// One configured timer slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEntry {
    /// Position in the upstream list.
    pub index: usize,
    /// Label shown by the INSNRG app (defaults to `index`).
    pub timer_number: u32,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub stop_time: String,
    /// Timer also runs the chlorinator.
    pub chlorinator: bool,
    pub enabled: bool,
}

impl TimerEntry {
    /// Whether `now` ("HH:MM") falls in `[start_time, stop_time)`.
    ///
    /// Plain string comparison, so a window that wraps midnight
    /// (stop before start) never matches.
    pub fn covers(&self, now: &str) -> bool {
        self.start_time.as_str() <= now && now < self.stop_time.as_str()
    }

    /// Enabled, chlorinator-linked, and covering `now`.
    pub fn runs_chlorinator_at(&self, now: &str) -> bool {
        self.enabled && self.chlorinator && self.covers(now)
    }

    /// Decode a `SetTimerAppliance` body.
    ///
    /// A missing or null timer list means no timers are configured.
    pub fn list_from_response(body: &Value) -> Result<Vec<Self>, MalformedResponse> {
        let items = match body {
            Value::Null => return Ok(Vec::new()),
            Value::Array(items) => items,
            Value::Object(obj) => match obj.get("timers") {
                None | Some(Value::Null) => return Ok(Vec::new()),
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(MalformedResponse::new(
                        RESOURCE,
                        format!("timers is not a list: {}", other),
                    ))
                }
            },
            other => {
                return Err(MalformedResponse::new(
                    RESOURCE,
                    format!("unexpected body: {}", other),
                ))
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| Self::from_item(index, item))
            .collect()
    }

    fn from_item(index: usize, item: &Value) -> Result<Self, MalformedResponse> {
        let obj = item.as_object().ok_or_else(|| {
            MalformedResponse::new(RESOURCE, format!("timer {} is not an object", index))
        })?;

        let time = |keys: &[&str], what: &str| {
            field(obj, keys).and_then(lenient_string).ok_or_else(|| {
                MalformedResponse::new(RESOURCE, format!("timer {} has no {}", index, what))
            })
        };

        Ok(Self {
            index,
            timer_number: field(obj, &["timerNumber", "timer_number"])
                .and_then(lenient_f64)
                .map(|n| n as u32)
                .unwrap_or(index as u32),
            start_time: time(&["startTime", "start_time", "start"], "start time")?,
            stop_time: time(&["stopTime", "stop_time", "endTime", "stop"], "stop time")?,
            chlorinator: field(obj, &["chlorinator", "chlorinatorLinked", "operatesChlorinator"])
                .and_then(lenient_bool)
                .unwrap_or(false),
            enabled: field(obj, &["enabled", "isEnabled"])
                .and_then(lenient_bool)
                .unwrap_or(false),
        })
    }
}

/// Whether any enabled, chlorinator-linked timer is running at `now` ("HH:MM").
pub fn chlorinator_active(timers: &[TimerEntry], now: &str) -> bool {
    timers.iter().any(|t| t.runs_chlorinator_at(now))
}
