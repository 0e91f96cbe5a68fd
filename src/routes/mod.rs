// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod api;
pub mod slash;
pub mod tasks;

use crate::AppState;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(slash::routes())
        .merge(tasks::routes())
        .merge(api::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Constant-time check of the shared token guarding scheduler and admin
/// endpoints.
pub(crate) fn task_token_valid(state: &AppState, headers: &axum::http::HeaderMap) -> bool {
    use subtle::ConstantTimeEq;

    headers
        .get("x-tasks-token")
        .and_then(|value| value.to_str().ok())
        .map(|token| {
            token
                .as_bytes()
                .ct_eq(state.config.tasks_token.as_bytes())
                .into()
        })
        .unwrap_or(false)
}
