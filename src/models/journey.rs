// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Journey and waypoint models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single expedition instance walking a fixed route on aggregated steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    /// Database identifier
    pub id: i64,
    /// Name of the route origin (e.g. "Larkollen")
    pub origin: String,
    /// Name of the route destination
    pub destination: String,
    /// Total route length in meters (cumulative distance of the last waypoint)
    pub distance_meters: f64,
    /// Set when an admin starts the journey; unset while in preparation
    pub started_at: Option<NaiveDate>,
    /// Set once the cumulative traveled distance reaches the route length
    pub finished_at: Option<NaiveDate>,
}

impl Journey {
    /// Current lifecycle state, derived from the two date columns.
    pub fn state(&self) -> JourneyState {
        match (self.started_at, self.finished_at) {
            (None, _) => JourneyState::NotStarted,
            (Some(_), None) => JourneyState::Ongoing,
            (Some(_), Some(_)) => JourneyState::Finished,
        }
    }
}

/// Journey lifecycle. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JourneyState {
    NotStarted,
    Ongoing,
    Finished,
}

/// A recorded GPS point on the route with known distance from the origin.
///
/// Waypoints are created once when a route is uploaded and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position in the route's waypoint sequence, starting at 0
    pub seq: u32,
    pub lat: f64,
    pub lon: f64,
    /// Elevation in meters, when the track file carried one
    pub elevation: Option<f64>,
    /// Cumulative distance from the route origin in meters.
    /// Non-decreasing across the sequence; 0.0 at the first waypoint.
    pub distance: f64,
}
