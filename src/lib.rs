// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trek-Tracker: walk a pre-recorded route together, one day at a time
//!
//! This crate provides the backend for a chat-bot that converts a team's
//! aggregated daily step counts into simulated travel along a pre-recorded
//! GPS route, tracks step records over the journey's history, and posts a
//! composed progress report to the team channel.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::JourneyStore;
use services::{GeoClient, ImageStoreClient, MapRenderer, SlackClient, StepProviderClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: JourneyStore,
    pub slack: SlackClient,
    pub steps: StepProviderClient,
    pub geo: GeoClient,
    pub images: ImageStoreClient,
    pub renderer: MapRenderer,
}
