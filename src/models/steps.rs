// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily step records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed meters-per-step conversion used to turn step counts into distance.
///
/// Distances are always derived from step counts, never stored on their own.
pub const STRIDE_METERS: f64 = 0.75;

/// One person's step count for one day of a journey.
///
/// Append-only: written once per (journey, person, date) when the day is
/// processed, and used afterwards for historical record queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySteps {
    pub person_id: i64,
    pub date: NaiveDate,
    pub amount: u32,
}

impl DailySteps {
    /// Distance this step count contributes, in meters.
    pub fn distance_meters(&self) -> f64 {
        f64::from(self.amount) * STRIDE_METERS
    }
}
