// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task handler routes for Cloud Scheduler/Tasks callbacks.
//!
//! These endpoints are called by the task queue, not directly by users.

use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Router};
use std::sync::Arc;

/// Task handler routes (called by Cloud Scheduler/Tasks).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/refresh-drops", post(refresh_drops))
}

/// Run one full drops refresh pass.
///
/// Guarded two ways:
/// - the `x-cloudtasks-queuename` header must name our queue (Cloud Run
///   strips this header from external requests, so its presence guarantees
///   internal origin);
/// - a run-level single-flight lock skips overlapping triggers instead of
///   queueing them. Every send is additionally gated by its own delivery
///   flag, so a skipped run loses nothing.
async fn refresh_drops(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> StatusCode {
    let queue_name_header = headers.get("x-cloudtasks-queuename");
    let is_valid_queue = queue_name_header
        .and_then(|h| h.to_str().ok())
        .map(|name| name == crate::config::DROPS_QUEUE_NAME)
        .unwrap_or(false);

    if !is_valid_queue {
        tracing::warn!(
            header = ?queue_name_header,
            "Security Alert: Blocked unauthorized access to refresh_drops"
        );
        return StatusCode::FORBIDDEN;
    }

    let Ok(_guard) = state.refresh_lock.try_lock() else {
        tracing::info!("Refresh already running; skipping overlapping trigger");
        return StatusCode::OK;
    };

    let now = chrono::Utc::now();
    match state.refresh_service.refresh_all(now).await {
        Ok(summary) => {
            tracing::info!(
                fetched = summary.campaigns_fetched,
                new = summary.new_drops,
                updated = summary.updated_drops,
                failed = summary.dispatch.failed_drops,
                "Refresh pass finished"
            );
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = %e, "Refresh pass failed");
            // Return 500 to trigger a scheduler retry
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
