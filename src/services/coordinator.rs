// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Refresh coordinator.
//!
//! One refresh cycle:
//! 1. Renew credentials if expired
//! 2. Fetch the timer schedule and work out whether the chlorinator is running
//! 3. Fetch the dashboard (water temperature)
//! 4. Fetch chemistry, and only trust it while the chlorinator is running
//! 5. Publish a new snapshot
//!
//! Probes report garbage while the pump is off, so inactive cycles publish
//! the last reading taken while it was on.

use crate::models::dashboard::temperature_from_response;
use crate::models::timer::chlorinator_active;
use crate::models::{ChemistryReading, ChemistrySource, Snapshot, TimerEntry};
use crate::services::credentials::{CredentialError, CredentialManager};
use crate::services::insnrg::{FetchError, ResourceApi, Screen};
use crate::time_utils::{format_hhmm, Clock};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Bound on each upstream call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Scheduled refresh period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Why a refresh cycle did not publish a snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefreshError {
    /// Stored credentials are permanently unusable.
    #[error("Re-authentication required: {0}")]
    AuthRequired(String),

    #[error("Token renewal failed: {0}")]
    Renewal(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl RefreshError {
    pub fn is_auth_required(&self) -> bool {
        matches!(self, RefreshError::AuthRequired(_))
    }

    /// A later cycle may succeed without user involvement.
    pub fn is_transient(&self) -> bool {
        !self.is_auth_required()
    }
}

impl From<CredentialError> for RefreshError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::AuthExpired(msg) => RefreshError::AuthRequired(msg),
            CredentialError::Renewal(msg) => RefreshError::Renewal(msg),
        }
    }
}

/// Choose which chemistry reading to publish.
///
/// While the chlorinator runs, the fresh reading is published and becomes
/// the fallback. Otherwise the fresh reading is dropped and the fallback
/// (possibly none) is published instead.
pub fn select_chemistry(
    fallback: &mut Option<ChemistryReading>,
    chlorinator_active: bool,
    fresh: Option<ChemistryReading>,
) -> (Option<ChemistryReading>, ChemistrySource) {
    if chlorinator_active {
        *fallback = fresh.clone();
        let source = if fresh.is_some() {
            ChemistrySource::Live
        } else {
            ChemistrySource::None
        };
        return (fresh, source);
    }

    match fallback {
        Some(reading) => (Some(reading.clone()), ChemistrySource::Fallback),
        None => (None, ChemistrySource::None),
    }
}

/// State owned by whichever task holds the cycle gate.
#[derive(Default)]
struct CycleState {
    fallback: Option<ChemistryReading>,
    completed: u64,
    last_outcome: Option<Result<Arc<Snapshot>, RefreshError>>,
}

/// Produces snapshots for one pool system, at most one cycle at a time.
pub struct RefreshCoordinator {
    system_id: String,
    api: Arc<dyn ResourceApi>,
    credentials: CredentialManager,
    clock: Arc<dyn Clock>,
    request_timeout: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    cycle: Mutex<CycleState>,
    /// Mirrors `CycleState::completed` for callers not holding the gate.
    completed_cycles: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(
        system_id: impl Into<String>,
        api: Arc<dyn ResourceApi>,
        credentials: CredentialManager,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            api,
            credentials,
            clock,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            snapshot: RwLock::new(None),
            cycle: Mutex::new(CycleState::default()),
            completed_cycles: AtomicU64::new(0),
        }
    }

    /// Bound on each upstream fetch.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Last published snapshot, if any cycle has succeeded yet.
    pub fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Run a refresh cycle, or wait for the one already running and share its outcome.
    pub async fn trigger_refresh(&self) -> Result<Arc<Snapshot>, RefreshError> {
        let seen = self.completed_cycles.load(Ordering::Acquire);
        let mut state = self.cycle.lock().await;

        // A cycle finished while we waited for the gate.
        if state.completed != seen {
            if let Some(outcome) = state.last_outcome.clone() {
                tracing::debug!(system_id = %self.system_id, "Joined in-flight refresh");
                return outcome;
            }
        }

        let outcome = self.run_cycle(&mut state).await;

        match &outcome {
            Ok(snapshot) => tracing::info!(
                system_id = %self.system_id,
                timers = snapshot.timers.len(),
                chlorinator_active = snapshot.chlorinator_active,
                chemistry_source = ?snapshot.chemistry_source,
                "Refresh complete"
            ),
            Err(e) if e.is_auth_required() => {
                tracing::error!(system_id = %self.system_id, error = %e, "Refresh failed")
            }
            Err(e) => {
                tracing::warn!(system_id = %self.system_id, error = %e, "Refresh failed")
            }
        }

        state.completed += 1;
        state.last_outcome = Some(outcome.clone());
        self.completed_cycles
            .store(state.completed, Ordering::Release);
        outcome
    }

    /// Refresh every `interval` until the returned task is aborted.
    ///
    /// The first refresh is expected to have been run by the caller.
    pub fn spawn_scheduler(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; skip that tick.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                tracing::debug!(system_id = %coordinator.system_id, "Scheduled refresh");
                // Failures are logged by trigger_refresh; the next tick retries.
                let _ = coordinator.trigger_refresh().await;
            }
        })
    }

    async fn run_cycle(&self, state: &mut CycleState) -> Result<Arc<Snapshot>, RefreshError> {
        let credentials = self.credentials.ensure_valid().await?;
        let id_token = credentials.id_token.as_str();

        let timers_body = self.fetch(id_token, Screen::Timers).await?;
        let timers = TimerEntry::list_from_response(&timers_body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring malformed timer list");
            Vec::new()
        });

        let now = format_hhmm(self.clock.local_time());
        let active = chlorinator_active(&timers, &now);
        tracing::debug!(now = %now, chlorinator_active = active, "Evaluated timer windows");

        let dashboard_body = self.fetch(id_token, Screen::Dashboard).await?;
        let temperature = match temperature_from_response(&dashboard_body) {
            Ok(Some(t)) if t == 0.0 => {
                tracing::warn!("Temperature reads 0, possible sensor problem");
                Some(t)
            }
            Ok(Some(t)) => Some(t),
            Ok(None) => {
                tracing::warn!("No temperature reported, possible sensor problem");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed dashboard");
                None
            }
        };

        let chemistry_body = self.fetch(id_token, Screen::Chemistry).await?;
        let fresh = ChemistryReading::from_response(&chemistry_body).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring malformed chemistry");
            None
        });

        let (chemistry, chemistry_source) = select_chemistry(&mut state.fallback, active, fresh);

        let snapshot = Arc::new(Snapshot {
            timers,
            temperature,
            chemistry,
            chemistry_source,
            chlorinator_active: active,
            generated_at: self.clock.now(),
        });

        *self.snapshot.write().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.clone());
        Ok(snapshot)
    }

    async fn fetch(&self, id_token: &str, screen: Screen) -> Result<Value, FetchError> {
        tracing::debug!(resource = %screen, "Fetching");
        tokio::time::timeout(
            self.request_timeout,
            self.api.view(id_token, &self.system_id, screen),
        )
        .await
        .unwrap_or_else(|_| {
            Err(FetchError::new(
                screen,
                format!("timed out after {}s", self.request_timeout.as_secs_f64()),
            ))
        })
    }
}
