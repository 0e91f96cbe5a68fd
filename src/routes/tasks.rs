// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task handler routes for scheduler callbacks.
//!
//! These endpoints are called by the scheduler, not directly by users.
//! An external mutual-exclusion mechanism ensures at most one update run
//! per journey at a time; the endpoint itself stays idempotent per day.

use crate::error::AppError;
use crate::services::JourneyUpdater;
use crate::time_utils::parse_date;
use crate::AppState;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Task handler routes (called by the scheduler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/daily-update", post(daily_update))
}

#[derive(Debug, Deserialize)]
pub struct DailyUpdatePayload {
    /// Process up to this day; defaults to the current UTC date
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct DailyUpdateResponse {
    pub processed_messages: usize,
    pub posted_messages: usize,
}

/// Run the pending daily updates and post the composed reports.
async fn daily_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<DailyUpdatePayload>,
) -> Result<Json<DailyUpdateResponse>, (StatusCode, String)> {
    if !super::task_token_valid(&state, &headers) {
        tracing::warn!("Blocked unauthorized access to daily_update");
        return Err((StatusCode::FORBIDDEN, "forbidden".to_string()));
    }

    let today = match &payload.date {
        Some(raw) => parse_date(raw)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("invalid date: {raw}")))?,
        None => chrono::Utc::now().date_naive(),
    };

    tracing::info!(%today, "Running daily update");

    let updater = JourneyUpdater::new(
        &state.store,
        &state.steps,
        &state.geo,
        &state.images,
        &state.renderer,
    );
    let messages = updater.run_pending_updates(today).await.map_err(|err| {
        tracing::error!(error = %err, "Daily update failed");
        match err {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    })?;

    // Posting is per-message best-effort: a chat outage must not undo the
    // committed days, and the next run will not re-post them.
    let mut posted = 0;
    for message in &messages {
        match state
            .slack
            .post_message(
                &state.config.chat_channel_id,
                &message.blocks,
                &message.fallback,
            )
            .await
        {
            Ok(()) => posted += 1,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to post daily report");
            }
        }
    }

    tracing::info!(
        processed = messages.len(),
        posted,
        "Daily update completed"
    );

    Ok(Json(DailyUpdateResponse {
        processed_messages: messages.len(),
        posted_messages: posted,
    }))
}
