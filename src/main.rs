// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trek-Tracker API Server
//!
//! Turns a team's daily step counts into simulated travel along a
//! pre-recorded route and reports progress to the team chat channel.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trek_tracker::{
    config::Config,
    db::JourneyStore,
    services::{GeoClient, ImageStoreClient, MapRenderer, SlackClient, StepProviderClient},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Trek-Tracker API");

    // Open the journey database
    let store = JourneyStore::open(&config.database_path).expect("Failed to open database");
    tracing::info!(path = %config.database_path, "Database opened");

    // Initialize collaborator clients
    let slack = SlackClient::new(config.chat_bot_token.clone());
    let steps = StepProviderClient::new(
        config.step_provider_url.clone(),
        config.step_provider_key.clone(),
    );
    let geo = GeoClient::new(config.geo_lookup_url.clone(), config.geo_lookup_key.clone());
    let images = ImageStoreClient::new(
        config.image_store_url.clone(),
        config.image_store_token.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        slack,
        steps,
        geo,
        images,
        renderer: MapRenderer::default(),
    });

    // Build router
    let app = trek_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trek_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
