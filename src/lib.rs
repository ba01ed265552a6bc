// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! INSNRG Bridge: republish a pool chlorinator's cloud data
//!
//! This crate polls the INSNRG cloud API for timer, temperature and
//! chemistry state, keeps the Cognito tokens fresh, and serves the merged
//! result as individually addressable readings.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::RefreshCoordinator;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub coordinator: Arc<RefreshCoordinator>,
}
