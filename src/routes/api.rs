// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journey administration routes.
//!
//! Uploading a route and starting a journey are admin actions, gated by
//! the same shared token as the scheduler endpoint.

use crate::error::{AppError, Result};
use crate::services::route::RoutePath;
use crate::time_utils::parse_date;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/journeys", post(create_journey))
        .route("/journeys/{id}", get(get_journey))
        .route("/journeys/{id}/start", post(start_journey))
}

#[derive(Debug, Deserialize)]
pub struct CreateJourneyRequest {
    pub origin: String,
    pub destination: String,
    /// Track as a GeoJSON LineString document
    pub geojson: Option<String>,
    /// Track as an encoded polyline (precision 5)
    pub polyline: Option<String>,
}

#[derive(Serialize)]
pub struct CreateJourneyResponse {
    pub id: i64,
    pub distance_meters: f64,
    pub waypoints: usize,
}

/// Upload a route and create a journey for it.
async fn create_journey(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateJourneyRequest>,
) -> Result<Json<CreateJourneyResponse>> {
    if !super::task_token_valid(&state, &headers) {
        return Err(AppError::Unauthorized);
    }

    let route = match (&payload.geojson, &payload.polyline) {
        (Some(geojson), _) => RoutePath::from_geojson(geojson),
        (None, Some(polyline)) => RoutePath::from_polyline(polyline),
        (None, None) => {
            return Err(AppError::BadRequest(
                "either geojson or polyline is required".to_string(),
            ))
        }
    }
    .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let id = state
        .store
        .create_journey(&payload.origin, &payload.destination, route.waypoints())?;

    tracing::info!(
        journey_id = id,
        origin = %payload.origin,
        destination = %payload.destination,
        distance = route.total_distance(),
        "Journey uploaded"
    );

    Ok(Json(CreateJourneyResponse {
        id,
        distance_meters: route.total_distance(),
        waypoints: route.waypoints().len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct StartJourneyRequest {
    /// First day of the journey, `YYYY-MM-DD`
    pub date: String,
}

/// Start a journey. Only one journey may be ongoing at a time.
async fn start_journey(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<StartJourneyRequest>,
) -> Result<Json<serde_json::Value>> {
    if !super::task_token_valid(&state, &headers) {
        return Err(AppError::Unauthorized);
    }

    let date = parse_date(&payload.date)
        .ok_or_else(|| AppError::BadRequest(format!("invalid date: {}", payload.date)))?;
    state.store.start_journey(id, date)?;
    Ok(Json(serde_json::json!({ "started": true })))
}

#[derive(Serialize)]
pub struct JourneyResponse {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub distance_meters: f64,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub traveled_meters: f64,
}

/// Current journey summary.
async fn get_journey(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<JourneyResponse>> {
    let journey = state
        .store
        .journey(id)?
        .ok_or_else(|| AppError::NotFound(format!("journey {id}")))?;
    let traveled = state
        .store
        .most_recent_location(id)?
        .map(|l| l.distance_meters)
        .unwrap_or_default();

    Ok(Json(JourneyResponse {
        id: journey.id,
        origin: journey.origin,
        destination: journey.destination,
        distance_meters: journey.distance_meters,
        started_at: journey.started_at.map(crate::time_utils::format_date),
        finished_at: journey.finished_at.map(crate::time_utils::format_date),
        traveled_meters: traveled,
    }))
}
