// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task handler routes, invoked by Cloud Scheduler rather than end users.

use crate::config::SCHEDULER_HEADER;
use crate::error::{AppError, Result};
use crate::services::ScanOutcome;
use crate::AppState;
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/midnight-scan", post(midnight_scan))
}

/// Hourly scan for users whose local clock just struck midnight.
///
/// Only Cloud Scheduler sets the scheduler header; requests without it
/// are rejected. No user auth here since no user context is involved.
async fn midnight_scan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ScanOutcome>> {
    let from_scheduler = headers
        .get(SCHEDULER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "true")
        .unwrap_or(false);

    if !from_scheduler {
        tracing::warn!("midnight-scan request without scheduler header, rejecting");
        return Err(AppError::Forbidden);
    }

    let now = chrono::Utc::now();
    let outcome = state.scanner.run(now).await?;

    if !outcome.is_clean() {
        tracing::warn!(failed = outcome.failed, "Midnight scan had push failures");
    }
    tracing::info!(
        scanned = outcome.scanned,
        dispatched = outcome.dispatched,
        "Midnight scan complete"
    );

    Ok(Json(outcome))
}
