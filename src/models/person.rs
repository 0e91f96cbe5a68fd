// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Participant identity.

use serde::{Deserialize, Serialize};

/// A journey participant.
///
/// Identity is owned by the user directory behind the step provider; we
/// only carry the fields needed for report formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    /// Display color ("#rrggbb") used for the person's map segment
    pub color_hex: Option<String>,
}
