// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time handling.

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Python-style `datetime.isoformat()` layout used by persisted token expiries.
const NAIVE_EXPIRY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Format a wall-clock time the way timer schedules are written ("HH:MM").
pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Parse a stored token expiry.
///
/// Accepts RFC3339, or a naive timestamp in the host's local time zone.
/// Returns `None` when neither form matches.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(raw, NAIVE_EXPIRY_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Source of "now" for expiry checks and timer windows.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current wall-clock time at the pool.
    fn local_time(&self) -> NaiveTime;
}

/// Clock backed by the system time and local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_time(&self) -> NaiveTime {
        Local::now().time()
    }
}
