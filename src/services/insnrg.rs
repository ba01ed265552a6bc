// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! INSNRG cloud API client.
//!
//! Every resource lives behind the same URL. The request body picks the
//! screen (`params`) and the action (always `view`).

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// The INSNRG web app origin; the API rejects requests without it.
const APP_ORIGIN: &str = "https://www.insnrgapp.com";

/// Logical resources served by the API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Screen {
    /// Timer schedule.
    Timers,
    /// Live dashboard, including water temperature.
    Dashboard,
    /// pH/ORP readings.
    Chemistry,
}

impl Screen {
    /// Value of the `params` request field.
    pub fn params(&self) -> &'static str {
        match self {
            Screen::Timers => "SetTimerAppliance",
            Screen::Dashboard => "DashboardScreen",
            Screen::Chemistry => "ChemistryScreen",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.params())
    }
}

/// A resource fetch that failed (transport error, timeout, or non-2xx).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("INSNRG {resource} fetch failed: {message}")]
pub struct FetchError {
    pub resource: Screen,
    pub message: String,
}

impl FetchError {
    pub fn new(resource: Screen, message: impl Into<String>) -> Self {
        Self {
            resource,
            message: message.into(),
        }
    }
}

/// Read access to the INSNRG resources of one pool system.
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Fetch one screen. A 2xx body that is not JSON comes back as `Value::Null`.
    async fn view(&self, id_token: &str, system_id: &str, screen: Screen)
        -> Result<Value, FetchError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewRequest<'a> {
    system_id: &'a str,
    params: &'static str,
    action: &'static str,
}

/// HTTP client for the INSNRG API.
#[derive(Clone)]
pub struct InsnrgClient {
    http: reqwest::Client,
    api_url: String,
}

impl InsnrgClient {
    pub fn new(api_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building INSNRG HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl ResourceApi for InsnrgClient {
    async fn view(
        &self,
        id_token: &str,
        system_id: &str,
        screen: Screen,
    ) -> Result<Value, FetchError> {
        let request = ViewRequest {
            system_id,
            params: screen.params(),
            action: "view",
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(id_token)
            .header(reqwest::header::ORIGIN, APP_ORIGIN)
            .json(&request)
            .send()
            .await
            .map_err(|e| FetchError::new(screen, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(resource = %screen, status = %status, body = %body, "INSNRG API error");
            return Err(FetchError::new(screen, format!("HTTP {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchError::new(screen, format!("Failed to read body: {}", e)))?;

        Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(resource = %screen, error = %e, "INSNRG response is not JSON");
            Value::Null
        }))
    }
}
