// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod achievements;
pub mod fitness;
pub mod geo_lookup;
pub mod map;
pub mod narrative;
pub mod progress;
pub mod route;
pub mod slack;
pub mod storage;
pub mod update;

pub use achievements::AchievementEngine;
pub use fitness::{StepProviderClient, StepSource};
pub use geo_lookup::{GeoClient, GeoLookup};
pub use map::MapRenderer;
pub use route::{RouteError, RoutePath};
pub use slack::SlackClient;
pub use storage::{ImageStore, ImageStoreClient};
pub use update::JourneyUpdater;
