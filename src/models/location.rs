// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily location records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The committed end-of-day position of a journey.
///
/// One row per (journey, date), written together with the day's step rows.
/// The most recent row is the authoritative current position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyLocation {
    pub journey_id: i64,
    pub date: NaiveDate,
    pub lat: f64,
    pub lon: f64,
    /// Cumulative traveled distance at the end of this day, in meters
    pub distance_meters: f64,
    /// Sequence number of the last waypoint at or before the position
    pub nearest_waypoint: u32,
    /// Resolved street/place address, when geocoding succeeded
    pub address: Option<String>,
    /// Resolved country name, when geocoding succeeded
    pub country: Option<String>,
    /// Nearby point of interest, when the places lookup succeeded
    pub poi: Option<String>,
    /// Public URL of the rendered overview map
    pub overview_image_url: Option<String>,
    /// Public URL of the rendered detail map
    pub detail_image_url: Option<String>,
}
