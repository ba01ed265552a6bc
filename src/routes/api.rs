// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Snapshot, reading and refresh endpoints.

use crate::error::{AppError, Result};
use crate::models::{Quantity, Reading, Snapshot};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/readings", get(list_readings))
        .route("/api/readings/{id}", get(get_reading))
        .route("/api/refresh", post(refresh))
}

fn current(state: &AppState) -> Result<Arc<Snapshot>> {
    state
        .coordinator
        .current_snapshot()
        .ok_or(AppError::NotReady)
}

/// Last published snapshot.
async fn get_snapshot(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>> {
    let snapshot = current(&state)?;
    Ok(Json(Snapshot::clone(&snapshot)))
}

/// Every reading projected from the last snapshot.
async fn list_readings(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Reading>>> {
    let snapshot = current(&state)?;
    Ok(Json(Reading::project_all(
        &snapshot,
        &state.config.thresholds,
    )))
}

/// One reading by id (e.g. `currentPh`, `start_time_0`).
async fn get_reading(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Reading>> {
    let snapshot = current(&state)?;

    let quantity = Quantity::from_id(&id)
        .filter(|q| Quantity::for_snapshot(&snapshot).contains(q))
        .ok_or_else(|| AppError::NotFound(format!("Reading {}", id)))?;

    Ok(Json(Reading::project(
        quantity,
        &snapshot,
        &state.config.thresholds,
    )))
}

/// Refresh now (or join the refresh already running).
///
/// The cycle runs in its own task so a client disconnect cannot cancel it
/// while it holds the gate.
async fn refresh(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>> {
    tracing::info!("On-demand refresh requested");
    let coordinator = state.coordinator.clone();
    let snapshot = tokio::spawn(async move { coordinator.trigger_refresh().await })
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Refresh task failed: {}", e)))??;
    Ok(Json(Snapshot::clone(&snapshot)))
}
