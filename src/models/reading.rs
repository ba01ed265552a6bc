// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Individually addressable readings projected from a snapshot.
//!
//! Each physical quantity is one `Quantity` variant. A projection never
//! fetches anything; it only reads the snapshot it is given.

use super::Snapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Namespace prefix for stable reading identifiers.
const DOMAIN: &str = "insnrg_chlorinator";

/// pH above this is a probe glitch, not water chemistry.
const MAX_PLAUSIBLE_PH: f64 = 14.0;
/// ORP (mV) above this is a probe glitch.
const MAX_PLAUSIBLE_ORP: i64 = 2000;

/// Every quantity the bridge republishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    CurrentPh,
    SetPointPh,
    PhConnected,
    CurrentOrp,
    SetPointOrp,
    OrpConnected,
    Temperature,
    TimerStart(usize),
    TimerStop(usize),
    TimerChlorinator(usize),
    TimerEnabled(usize),
}

impl Quantity {
    /// Quantities that exist regardless of timer configuration.
    pub const FIXED: [Quantity; 7] = [
        Quantity::CurrentPh,
        Quantity::SetPointPh,
        Quantity::PhConnected,
        Quantity::CurrentOrp,
        Quantity::SetPointOrp,
        Quantity::OrpConnected,
        Quantity::Temperature,
    ];

    /// All quantities available for a snapshot (fixed set plus four per timer).
    pub fn for_snapshot(snapshot: &Snapshot) -> Vec<Quantity> {
        let mut all = Self::FIXED.to_vec();
        for index in 0..snapshot.timers.len() {
            all.extend([
                Quantity::TimerStart(index),
                Quantity::TimerStop(index),
                Quantity::TimerChlorinator(index),
                Quantity::TimerEnabled(index),
            ]);
        }
        all
    }

    fn key(&self) -> &'static str {
        match self {
            Quantity::CurrentPh => "currentPh",
            Quantity::SetPointPh => "setPointPh",
            Quantity::PhConnected => "pHConnected",
            Quantity::CurrentOrp => "currentORP",
            Quantity::SetPointOrp => "setPointORP",
            Quantity::OrpConnected => "orpConnected",
            Quantity::Temperature => "temperature",
            Quantity::TimerStart(_) => "start_time",
            Quantity::TimerStop(_) => "stop_time",
            Quantity::TimerChlorinator(_) => "chlorinator",
            Quantity::TimerEnabled(_) => "enabled",
        }
    }

    fn timer_index(&self) -> Option<usize> {
        match self {
            Quantity::TimerStart(i)
            | Quantity::TimerStop(i)
            | Quantity::TimerChlorinator(i)
            | Quantity::TimerEnabled(i) => Some(*i),
            _ => None,
        }
    }

    /// Path-friendly identifier, e.g. `currentPh` or `start_time_2`.
    pub fn id(&self) -> String {
        match self.timer_index() {
            Some(index) => format!("{}_{}", self.key(), index),
            None => self.key().to_string(),
        }
    }

    /// Parse an identifier produced by [`Quantity::id`].
    pub fn from_id(id: &str) -> Option<Quantity> {
        if let Some(fixed) = Self::FIXED.iter().find(|q| q.key() == id) {
            return Some(*fixed);
        }

        let (key, index) = id.rsplit_once('_')?;
        let index: usize = index.parse().ok()?;
        match key {
            "start_time" => Some(Quantity::TimerStart(index)),
            "stop_time" => Some(Quantity::TimerStop(index)),
            "chlorinator" => Some(Quantity::TimerChlorinator(index)),
            "enabled" => Some(Quantity::TimerEnabled(index)),
            _ => None,
        }
    }

    /// Identifier that stays the same across restarts.
    pub fn unique_id(&self) -> Uuid {
        Uuid::new_v5(
            &Uuid::NAMESPACE_DNS,
            format!("{}_{}", DOMAIN, self.id()).as_bytes(),
        )
    }

    /// Display name; timers use the number the INSNRG app shows.
    pub fn name(&self, snapshot: &Snapshot) -> String {
        let timer_label = |index: usize| {
            snapshot
                .timer(index)
                .map(|t| t.timer_number as usize)
                .unwrap_or(index)
        };

        match self {
            Quantity::CurrentPh => "Chlorinator Current pH".to_string(),
            Quantity::SetPointPh => "Chlorinator Set Point pH".to_string(),
            Quantity::PhConnected => "Chlorinator pH Connected".to_string(),
            Quantity::CurrentOrp => "Chlorinator Current ORP".to_string(),
            Quantity::SetPointOrp => "Chlorinator Set Point ORP".to_string(),
            Quantity::OrpConnected => "Chlorinator ORP Connected".to_string(),
            Quantity::Temperature => "Pool Current Temperature".to_string(),
            Quantity::TimerStart(i) => format!("INSNRG Timer {} Start", timer_label(*i)),
            Quantity::TimerStop(i) => format!("INSNRG Timer {} End", timer_label(*i)),
            Quantity::TimerChlorinator(i) => {
                format!("INSNRG Timer {} Operates Chlorinator", timer_label(*i))
            }
            Quantity::TimerEnabled(i) => format!("INSNRG Timer {} Enabled", timer_label(*i)),
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Quantity::CurrentOrp | Quantity::SetPointOrp => Some("mV"),
            Quantity::Temperature => Some("°C"),
            _ => None,
        }
    }

    /// Current value in `snapshot`, with implausible probe values suppressed.
    pub fn value(&self, snapshot: &Snapshot) -> ReadingValue {
        let chemistry = snapshot.chemistry.as_ref();
        let ph = |v: Option<f64>| match v {
            Some(v) if v <= MAX_PLAUSIBLE_PH => ReadingValue::Number(v),
            _ => ReadingValue::Unknown,
        };
        let orp = |v: Option<i64>| match v {
            Some(v) if v <= MAX_PLAUSIBLE_ORP => ReadingValue::Integer(v),
            _ => ReadingValue::Unknown,
        };
        let timer = self.timer_index().and_then(|i| snapshot.timer(i));

        match self {
            Quantity::CurrentPh => ph(chemistry.map(|c| c.current_ph)),
            Quantity::SetPointPh => ph(chemistry.and_then(|c| c.ph_set_point)),
            Quantity::PhConnected => chemistry.and_then(|c| c.ph_connected).into(),
            Quantity::CurrentOrp => orp(chemistry.map(|c| c.current_orp)),
            Quantity::SetPointOrp => orp(chemistry.and_then(|c| c.orp_set_point)),
            Quantity::OrpConnected => chemistry.and_then(|c| c.orp_connected).into(),
            Quantity::Temperature => snapshot
                .temperature
                .map(ReadingValue::Number)
                .unwrap_or(ReadingValue::Unknown),
            Quantity::TimerStart(_) => timer.map(|t| t.start_time.clone()).into(),
            Quantity::TimerStop(_) => timer.map(|t| t.stop_time.clone()).into(),
            Quantity::TimerChlorinator(_) => timer.map(|t| t.chlorinator).into(),
            Quantity::TimerEnabled(_) => timer.map(|t| t.enabled).into(),
        }
    }

    /// Range status for the current pH/ORP values.
    pub fn status(&self, snapshot: &Snapshot, thresholds: &Thresholds) -> Option<ReadingStatus> {
        let (value, low, high) = match (self, self.value(snapshot)) {
            (Quantity::CurrentPh, ReadingValue::Number(v)) => {
                (v, thresholds.ph_low, thresholds.ph_high)
            }
            (Quantity::CurrentOrp, ReadingValue::Integer(v)) => (
                v as f64,
                thresholds.orp_low as f64,
                thresholds.orp_high as f64,
            ),
            _ => return None,
        };

        Some(if value < low {
            ReadingStatus::Low
        } else if value > high {
            ReadingStatus::High
        } else {
            ReadingStatus::Normal
        })
    }
}

/// Value of a single reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Number(f64),
    Integer(i64),
    Flag(bool),
    Text(String),
    /// Serialized as `null`.
    Unknown,
}

impl From<Option<bool>> for ReadingValue {
    fn from(value: Option<bool>) -> Self {
        value.map(ReadingValue::Flag).unwrap_or(ReadingValue::Unknown)
    }
}

impl From<Option<String>> for ReadingValue {
    fn from(value: Option<String>) -> Self {
        value.map(ReadingValue::Text).unwrap_or(ReadingValue::Unknown)
    }
}

/// Acceptable water chemistry ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub ph_low: f64,
    pub ph_high: f64,
    pub orp_low: i64,
    pub orp_high: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            ph_low: 7.0,
            ph_high: 7.8,
            orp_low: 600,
            orp_high: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingStatus {
    Low,
    Normal,
    High,
}

/// One reading as republished to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub id: String,
    pub unique_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub value: ReadingValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReadingStatus>,
    pub last_updated: DateTime<Utc>,
}

impl Reading {
    pub fn project(quantity: Quantity, snapshot: &Snapshot, thresholds: &Thresholds) -> Self {
        Self {
            id: quantity.id(),
            unique_id: quantity.unique_id(),
            name: quantity.name(snapshot),
            unit: quantity.unit(),
            value: quantity.value(snapshot),
            status: quantity.status(snapshot, thresholds),
            last_updated: snapshot.generated_at,
        }
    }

    /// Every reading the snapshot supports, in a stable order.
    pub fn project_all(snapshot: &Snapshot, thresholds: &Thresholds) -> Vec<Self> {
        Quantity::for_snapshot(snapshot)
            .into_iter()
            .map(|q| Self::project(q, snapshot, thresholds))
            .collect()
    }
}
