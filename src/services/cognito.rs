// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! AWS Cognito identity client for INSNRG token refresh.
//!
//! Talks to the Cognito IdP JSON API directly (`InitiateAuth` with the
//! `REFRESH_TOKEN_AUTH` flow). The INSNRG app client is public, so no
//! request signing or client secret is involved.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const INITIATE_AUTH_TARGET: &str = "AWSCognitoIdentityProviderService.InitiateAuth";
const AMZ_JSON: &str = "application/x-amz-json-1.1";
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Error codes meaning the refresh token itself is no longer usable.
const REJECTED_REFRESH_CODES: [&str; 2] = ["NotAuthorizedException", "InvalidRefreshTokenException"];

/// Tokens issued by a successful refresh.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthenticationResult {
    pub access_token: String,
    pub id_token: String,
    /// Lifetime of the access/id tokens in seconds.
    pub expires_in: i64,
    /// Only present when Cognito rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Default, Deserialize)]
struct CognitoErrorBody {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

/// Identity provider failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    /// Provider answered with an error code.
    #[error("{code}: {message}")]
    Provider { code: String, message: String },

    /// No usable answer (network, TLS, unexpected body).
    #[error("{0}")]
    Transport(String),
}

impl IdentityError {
    /// Provider says the refresh token is expired, revoked, or unknown.
    pub fn is_refresh_token_rejected(&self) -> bool {
        matches!(self, IdentityError::Provider { code, .. }
            if REJECTED_REFRESH_CODES.contains(&code.as_str()))
    }
}

/// Exchanges a refresh token for a new access/id token pair.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthenticationResult, IdentityError>;
}

/// Cognito IdP client.
#[derive(Clone)]
pub struct CognitoClient {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
}

impl CognitoClient {
    /// Create a client for the user pool app client in `region`.
    pub fn new(client_id: &str, region: &str, timeout: Duration) -> anyhow::Result<Self> {
        Self::with_endpoint(
            client_id,
            &format!("https://cognito-idp.{}.amazonaws.com/", region),
            timeout,
        )
    }

    /// Create a client against an explicit endpoint URL.
    pub fn with_endpoint(client_id: &str, endpoint: &str, timeout: Duration) -> anyhow::Result<Self> {
        if client_id.trim().is_empty() {
            anyhow::bail!("Cognito client id must not be empty");
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building Cognito HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            client_id: client_id.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for CognitoClient {
    async fn refresh(&self, refresh_token: &str) -> Result<AuthenticationResult, IdentityError> {
        let body = serde_json::json!({
            "ClientId": self.client_id,
            "AuthFlow": "REFRESH_TOKEN_AUTH",
            "AuthParameters": {
                "REFRESH_TOKEN": refresh_token
            }
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Amz-Target", INITIATE_AUTH_TARGET)
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| IdentityError::Transport(format!("Token refresh request failed: {}", e)))?;

        let status = response.status();
        let header_code = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(normalize_error_code);
        let text = response
            .text()
            .await
            .map_err(|e| IdentityError::Transport(format!("Failed to read Cognito response: {}", e)))?;

        if !status.is_success() {
            let parsed: CognitoErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let code = parsed
                .error_type
                .as_deref()
                .map(normalize_error_code)
                .or(header_code)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

            tracing::warn!(status = %status, code = %code, "Cognito token refresh failed");
            return Err(IdentityError::Provider {
                code,
                message: parsed.message.unwrap_or(text),
            });
        }

        let parsed: InitiateAuthResponse = serde_json::from_str(&text).map_err(|e| {
            IdentityError::Transport(format!("Failed to parse Cognito response: {}", e))
        })?;

        parsed.authentication_result.ok_or_else(|| {
            IdentityError::Transport("Cognito response has no AuthenticationResult".to_string())
        })
    }
}

/// Strip namespace prefixes and URL suffixes from an AWS error type.
///
/// `com.amazonaws.cognito#NotAuthorizedException` and
/// `NotAuthorizedException:http://internal.amazon.com/` both become
/// `NotAuthorizedException`.
fn normalize_error_code(raw: &str) -> String {
    let without_suffix = raw.split(':').next().unwrap_or(raw);
    without_suffix
        .rsplit('#')
        .next()
        .unwrap_or(without_suffix)
        .trim()
        .to_string()
}
