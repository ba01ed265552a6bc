// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use insnrg_bridge::config::Config;
use insnrg_bridge::models::{CredentialSet, Expiry};
use insnrg_bridge::routes::create_router;
use insnrg_bridge::services::{
    AuthenticationResult, CredentialManager, FetchError, IdentityError, IdentityProvider,
    RefreshCoordinator, ResourceApi, Screen,
};
use insnrg_bridge::time_utils::Clock;
use insnrg_bridge::AppState;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SYSTEM_ID: &str = "pool-system-1";

/// Clock pinned to a fixed instant, with an adjustable pool-local time.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
    local: Mutex<NaiveTime>,
}

#[allow(dead_code)]
impl FixedClock {
    pub fn at(local_hhmm: &str) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()),
            local: Mutex::new(NaiveTime::parse_from_str(local_hhmm, "%H:%M").unwrap()),
        })
    }

    pub fn set_local(&self, local_hhmm: &str) {
        *self.local.lock().unwrap() = NaiveTime::parse_from_str(local_hhmm, "%H:%M").unwrap();
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn local_time(&self) -> NaiveTime {
        *self.local.lock().unwrap()
    }
}

/// Scripted identity provider.
///
/// Queued outcomes are returned in order; once empty every call succeeds
/// with numbered tokens and no refresh-token rotation.
#[derive(Default)]
pub struct FakeIdentity {
    queued: Mutex<VecDeque<Result<AuthenticationResult, IdentityError>>>,
    pub calls: AtomicUsize,
    pub seen_refresh_tokens: Mutex<Vec<String>>,
    delay: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, outcome: Result<AuthenticationResult, IdentityError>) {
        self.queued.lock().unwrap().push_back(outcome);
    }

    pub fn reject(&self, code: &str) {
        self.push(Err(IdentityError::Provider {
            code: code.to_string(),
            message: "Refresh Token has been revoked".to_string(),
        }));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthenticationResult, IdentityError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen_refresh_tokens
            .lock()
            .unwrap()
            .push(refresh_token.to_string());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.queued.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(AuthenticationResult {
                access_token: format!("access-{}", n),
                id_token: format!("id-{}", n),
                expires_in: 3600,
                refresh_token: None,
            })
        })
    }
}

/// Scripted INSNRG API.
///
/// Each screen answers with its configured body or error. `gate` can be
/// held by a test to park every call until it is released.
pub struct FakeApi {
    responses: Mutex<HashMap<Screen, Result<Value, String>>>,
    pub calls: AtomicUsize,
    pub seen_tokens: Mutex<Vec<String>>,
    pub gate: tokio::sync::Mutex<()>,
    delay: Mutex<Option<Duration>>,
}

#[allow(dead_code)]
impl FakeApi {
    /// API with no timers, a 27.5 °C dashboard and a healthy chemistry reading.
    pub fn new() -> Arc<Self> {
        let api = Self {
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            seen_tokens: Mutex::new(Vec::new()),
            gate: tokio::sync::Mutex::new(()),
            delay: Mutex::new(None),
        };
        api.set(Screen::Timers, json!({"timers": []}));
        api.set(Screen::Dashboard, dashboard(27.5));
        api.set(Screen::Chemistry, chemistry(7.4, 650));
        Arc::new(api)
    }

    pub fn set(&self, screen: Screen, body: Value) {
        self.responses.lock().unwrap().insert(screen, Ok(body));
    }

    pub fn fail(&self, screen: Screen, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(screen, Err(message.to_string()));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceApi for FakeApi {
    async fn view(
        &self,
        id_token: &str,
        system_id: &str,
        screen: Screen,
    ) -> Result<Value, FetchError> {
        assert_eq!(system_id, SYSTEM_ID);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens.lock().unwrap().push(id_token.to_string());

        let _gate = self.gate.lock().await;

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().unwrap().get(&screen).cloned();
        match response {
            Some(Ok(body)) => Ok(body),
            Some(Err(message)) => Err(FetchError::new(screen, message)),
            None => Err(FetchError::new(screen, "HTTP 404 Not Found")),
        }
    }
}

/// Chemistry body as the INSNRG API sends it.
pub fn chemistry(ph: f64, orp: i64) -> Value {
    json!({
        "poolChemistry": {
            "currentPh": ph,
            "setPointPh": 7.2,
            "pHConnected": true,
            "currentORP": orp,
            "setPointORP": 700,
            "orpConnected": true
        }
    })
}

/// Dashboard body with the live data JSON-encoded into a string.
pub fn dashboard(temperature: f64) -> Value {
    json!({ "liveData": json!({ "temperature": temperature }).to_string() })
}

/// Timer list with one chlorinator-linked window.
#[allow(dead_code)]
pub fn chlorinator_timer(start: &str, stop: &str) -> Value {
    json!({
        "timers": [
            {"timerNumber": 1, "startTime": start, "stopTime": stop, "chlorinator": true, "enabled": true}
        ]
    })
}

/// Credentials valid for another hour relative to `clock`.
pub fn valid_credentials(clock: &FixedClock) -> CredentialSet {
    CredentialSet {
        access_token: "initial-access".to_string(),
        id_token: "initial-id".to_string(),
        refresh_token: "initial-refresh".to_string(),
        expiry: Expiry::At(clock.now() + chrono::Duration::hours(1)),
    }
}

/// Credentials that expired an hour ago relative to `clock`.
#[allow(dead_code)]
pub fn expired_credentials(clock: &FixedClock) -> CredentialSet {
    CredentialSet {
        expiry: Expiry::At(clock.now() - chrono::Duration::hours(1)),
        ..valid_credentials(clock)
    }
}

/// Coordinator wired to the given fakes.
pub fn coordinator(
    api: &Arc<FakeApi>,
    identity: &Arc<FakeIdentity>,
    clock: &Arc<FixedClock>,
    credentials: CredentialSet,
) -> Arc<RefreshCoordinator> {
    let manager = CredentialManager::new(identity.clone(), credentials, clock.clone());
    Arc::new(RefreshCoordinator::new(
        SYSTEM_ID,
        api.clone(),
        manager,
        clock.clone(),
    ))
}

/// Router plus the fakes behind it.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<FakeApi>, Arc<FakeIdentity>, Arc<FixedClock>) {
    let api = FakeApi::new();
    let identity = FakeIdentity::new();
    let clock = FixedClock::at("12:00");
    let coordinator = coordinator(&api, &identity, &clock, valid_credentials(&clock));

    let state = Arc::new(AppState {
        config: Config {
            system_id: SYSTEM_ID.to_string(),
            ..Config::default()
        },
        coordinator,
    });

    (create_router(state), api, identity, clock)
}
