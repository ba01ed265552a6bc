// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Published result of one refresh cycle.

use super::{ChemistryReading, TimerEntry};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the published chemistry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChemistrySource {
    /// Fetched this cycle while the chlorinator was running.
    Live,
    /// Carried over from the last cycle where the chlorinator was running.
    Fallback,
    /// Nothing captured yet.
    None,
}

/// Immutable merged view of timers, temperature and chemistry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub timers: Vec<TimerEntry>,
    /// Water temperature in °C.
    pub temperature: Option<f64>,
    pub chemistry: Option<ChemistryReading>,
    pub chemistry_source: ChemistrySource,
    pub chlorinator_active: bool,
    pub generated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Timer at `index`, if the last fetch returned that many.
    pub fn timer(&self, index: usize) -> Option<&TimerEntry> {
        self.timers.get(index)
    }
}
