// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential manager: owns the Cognito token set and renews it.

use crate::models::{CredentialSet, Expiry};
use crate::services::cognito::IdentityProvider;
use crate::time_utils::Clock;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;

/// Tokens expiring within this margin are renewed ahead of time.
const EXPIRY_MARGIN_SECS: i64 = 60;

const DEFAULT_RENEW_TIMEOUT: Duration = Duration::from_secs(10);

/// Renewal failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CredentialError {
    /// The refresh token is unusable; only the user can fix this.
    #[error("Refresh token invalid or expired, re-authentication required: {0}")]
    AuthExpired(String),

    /// Transient provider or transport failure.
    #[error("Error refreshing token: {0}")]
    Renewal(String),
}

/// Holds the current `CredentialSet` and is the only thing that replaces it.
///
/// Readers get an `Arc` to an immutable set; renewal swaps in a new one.
pub struct CredentialManager {
    provider: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    current: RwLock<Arc<CredentialSet>>,
    /// Serializes renewals so a refresh token is never spent twice.
    renew_lock: Mutex<()>,
    renew_timeout: Duration,
}

impl CredentialManager {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        initial: CredentialSet,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            clock,
            current: RwLock::new(Arc::new(initial)),
            renew_lock: Mutex::new(()),
            renew_timeout: DEFAULT_RENEW_TIMEOUT,
        }
    }

    /// Bound on a single renewal call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.renew_timeout = timeout;
        self
    }

    /// Current credentials.
    pub fn credentials(&self) -> Arc<CredentialSet> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether the access/id tokens need renewing.
    ///
    /// An expiry that cannot be parsed counts as expired.
    pub fn is_expired(&self) -> bool {
        let current = self.credentials();
        let expires_at = match &current.expiry {
            Expiry::At(at) => Some(*at),
            Expiry::Raw(raw) => {
                let parsed = current.expiry.resolve();
                match parsed {
                    Some(at) => self.store_parsed_expiry(&current, at),
                    None => tracing::warn!(expiry = %raw, "Unparsable token expiry, treating as expired"),
                }
                parsed
            }
        };

        match expires_at {
            Some(at) => {
                let expired = self.clock.now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS) >= at;
                if expired {
                    tracing::debug!(expires_at = %at, "Token has expired");
                }
                expired
            }
            None => true,
        }
    }

    /// Exchange the refresh token for new access/id tokens.
    pub async fn renew(&self) -> Result<Arc<CredentialSet>, CredentialError> {
        let _guard = self.renew_lock.lock().await;
        self.renew_locked().await
    }

    /// Current credentials, renewed first if they have expired.
    pub async fn ensure_valid(&self) -> Result<Arc<CredentialSet>, CredentialError> {
        if !self.is_expired() {
            return Ok(self.credentials());
        }

        let _guard = self.renew_lock.lock().await;

        // Another task may have renewed while we waited.
        if !self.is_expired() {
            return Ok(self.credentials());
        }

        self.renew_locked().await
    }

    async fn renew_locked(&self) -> Result<Arc<CredentialSet>, CredentialError> {
        tracing::info!("Refreshing access token");
        let current = self.credentials();

        let result = tokio::time::timeout(
            self.renew_timeout,
            self.provider.refresh(&current.refresh_token),
        )
        .await
        .map_err(|_| {
            CredentialError::Renewal(format!(
                "timed out after {}s",
                self.renew_timeout.as_secs_f64()
            ))
        })?;

        let auth = match result {
            Ok(auth) => auth,
            Err(e) if e.is_refresh_token_rejected() => {
                tracing::error!(
                    error = %e,
                    "Refresh token expired or invalid, re-authentication required"
                );
                return Err(CredentialError::AuthExpired(e.to_string()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                return Err(CredentialError::Renewal(e.to_string()));
            }
        };

        if auth.expires_in <= 0 {
            return Err(CredentialError::Renewal(format!(
                "provider declared non-positive token lifetime {}",
                auth.expires_in
            )));
        }

        let issued_at = self.clock.now();
        let rotated = auth.refresh_token.is_some();
        let renewed = Arc::new(CredentialSet {
            access_token: auth.access_token,
            id_token: auth.id_token,
            refresh_token: auth
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
            expiry: Expiry::At(issued_at + chrono::Duration::seconds(auth.expires_in)),
        });

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = renewed.clone();

        tracing::info!(
            expires_in = auth.expires_in,
            refresh_token_rotated = rotated,
            "Token refresh successful"
        );
        Ok(renewed)
    }

    /// Replace a raw expiry with its parsed form, unless the set changed meanwhile.
    fn store_parsed_expiry(&self, seen: &Arc<CredentialSet>, at: DateTime<Utc>) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        if Arc::ptr_eq(&*guard, seen) {
            let mut parsed = CredentialSet::clone(seen);
            parsed.expiry = Expiry::At(at);
            *guard = Arc::new(parsed);
        }
    }
}
