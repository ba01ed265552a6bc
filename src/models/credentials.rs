// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cognito credential set.

use crate::time_utils::parse_expiry;
use chrono::{DateTime, Utc};
use std::fmt;

/// When the access/id token pair stops being valid.
#[derive(Debug, Clone, PartialEq)]
pub enum Expiry {
    /// Parsed timestamp.
    At(DateTime<Utc>),
    /// Value as loaded from configuration, not yet parsed.
    Raw(String),
}

impl Expiry {
    /// Structured form, parsing a raw value if needed.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::At(at) => Some(*at),
            Expiry::Raw(raw) => parse_expiry(raw),
        }
    }
}

/// Access/id/refresh tokens plus the access token expiry.
///
/// Only `CredentialManager` replaces these; everyone else gets a shared copy.
#[derive(Clone, PartialEq)]
pub struct CredentialSet {
    pub access_token: String,
    /// Sent as the bearer token on INSNRG API calls.
    pub id_token: String,
    pub refresh_token: String,
    pub expiry: Expiry,
}

// Tokens never go to the logs.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_token", &"<redacted>")
            .field("id_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}
