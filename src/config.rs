//! Application configuration loaded from environment variables.
//!
//! Holds what the host would otherwise keep in its config entry: the pool
//! system id, the initial Cognito tokens, and the API endpoints.

use crate::models::{CredentialSet, Expiry, Thresholds};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Upstream ---
    /// INSNRG API endpoint (single URL for all screens)
    pub api_url: String,
    /// Remote pool-control system id
    pub system_id: String,
    /// Cognito app client id (public)
    pub cognito_client_id: String,
    /// Cognito region
    pub cognito_region: String,

    // --- Initial credentials ---
    pub credentials: CredentialSet,

    // --- Scheduling ---
    pub refresh_interval: Duration,
    /// Bound on each upstream call
    pub request_timeout: Duration,

    // --- Presentation ---
    pub thresholds: Thresholds,
    /// Server port
    pub port: u16,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_url: "http://localhost:9000/api".to_string(),
            system_id: "test-system".to_string(),
            cognito_client_id: "test_client_id".to_string(),
            cognito_region: "us-east-2".to_string(),
            credentials: CredentialSet {
                access_token: "test_access".to_string(),
                id_token: "test_id".to_string(),
                refresh_token: "test_refresh".to_string(),
                expiry: Expiry::Raw(String::new()),
            },
            refresh_interval: Duration::from_secs(3600),
            request_timeout: Duration::from_secs(10),
            thresholds: Thresholds::default(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is honored for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Thresholds::default();

        Ok(Self {
            api_url: required("INSNRG_API_URL")?,
            system_id: required("INSNRG_SYSTEM_ID")?,
            cognito_client_id: required("COGNITO_CLIENT_ID")?,
            cognito_region: env::var("COGNITO_REGION").unwrap_or_else(|_| "us-east-2".to_string()),

            credentials: CredentialSet {
                access_token: required("INSNRG_ACCESS_TOKEN")?,
                id_token: required("INSNRG_ID_TOKEN")?,
                refresh_token: required("INSNRG_REFRESH_TOKEN")?,
                // Missing expiry fails safe: the first cycle renews.
                expiry: Expiry::Raw(env::var("INSNRG_TOKEN_EXPIRY").unwrap_or_default()),
            },

            refresh_interval: seconds("REFRESH_INTERVAL_SECS", 3600)?,
            request_timeout: seconds("REQUEST_TIMEOUT_SECS", 10)?,

            thresholds: Thresholds {
                ph_low: parsed("PH_LOW", defaults.ph_low)?,
                ph_high: parsed("PH_HIGH", defaults.ph_high)?,
                orp_low: parsed("ORP_LOW", defaults.orp_low)?,
                orp_high: parsed("ORP_HIGH", defaults.orp_high)?,
            },
            port: parsed("PORT", 8080)?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// A non-zero whole number of seconds.
fn seconds(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match parsed(name, default)? {
        0 => Err(ConfigError::Invalid(name, "0".to_string())),
        secs => Ok(Duration::from_secs(secs)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
