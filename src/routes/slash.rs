// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slash-command endpoint.
//!
//! The chat workspace POSTs slash commands as form-encoded bodies signed
//! with the workspace secret. The body must be verified against the raw
//! bytes, so the handler takes the body unparsed and decodes the form
//! itself.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::services::achievements::AchievementEngine;
use crate::services::fitness::StepSource;
use crate::services::narrative::{self, Narrative};
use crate::services::{slack, update};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/slash", post(handle_slash))
}

async fn handle_slash(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let body_text = std::str::from_utf8(&body)
        .map_err(|_| AppError::BadRequest("body is not UTF-8".to_string()))?;

    let timestamp = header_value(&headers, "x-slack-request-timestamp")?;
    let signature = header_value(&headers, "x-slack-signature")?;
    if !slack::timestamp_fresh(timestamp, chrono::Utc::now().timestamp())
        || !slack::verify_signature(
            &state.config.chat_signing_secret,
            timestamp,
            body_text,
            signature,
        )
    {
        tracing::warn!("Rejected slash command with bad signature or stale timestamp");
        return Err(AppError::Unauthorized);
    }

    let form = parse_form(body_text);
    let text = form.get("text").map(String::as_str).unwrap_or("");

    let narrative = match text.trim() {
        "" | "status" => status(&state).await?,
        "standings" | "records" => standings(&state).await?,
        "weight" => weight(&state).await?,
        other => help(other),
    };

    Ok(Json(json!({
        "response_type": "in_channel",
        "text": narrative.fallback,
        "blocks": narrative.blocks,
    })))
}

/// Where are we, how far to go.
async fn status(state: &AppState) -> Result<Narrative> {
    let Some(journey) = state.store.ongoing_journey()? else {
        return Ok(no_journey());
    };
    let latest = state.store.most_recent_location(journey.id)?;

    Ok(narrative::status_report(
        &journey.origin,
        &journey.destination,
        latest.as_ref().map(|l| l.date),
        latest.as_ref().map(|l| l.distance_meters).unwrap_or_default(),
        journey.distance_meters,
        latest.as_ref().and_then(|l| l.address.as_deref()),
    ))
}

/// All-time record holders across every category.
async fn standings(state: &AppState) -> Result<Narrative> {
    let Some(journey) = state.store.ongoing_journey()? else {
        return Ok(no_journey());
    };
    let today = chrono::Utc::now().date_naive();
    let history = state.store.steps_up_to(journey.id, today)?;

    let names: HashMap<i64, String> = state
        .steps
        .enabled_participants()
        .await?
        .into_iter()
        .map(|p| (p.id, p.first_name))
        .collect();

    let engine = AchievementEngine::default();
    let lines: Vec<String> = engine
        .standings(&history, today)
        .iter()
        .map(|standing| standing.display(&names))
        .collect();
    Ok(narrative::standings_report(&lines))
}

/// On-demand weigh-in summary.
async fn weight(state: &AppState) -> Result<Narrative> {
    let participants = state.steps.enabled_participants().await?;
    let today = chrono::Utc::now().date_naive();
    let entries = update::collect_weights(&state.steps, &participants, today).await;
    Ok(narrative::weight_report(&entries))
}

fn help(unknown: &str) -> Narrative {
    let text = format!(
        "Unknown command `{unknown}`. Try `status`, `standings` or `weight`."
    );
    Narrative {
        blocks: vec![json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": text }
        })],
        fallback: text,
    }
}

fn no_journey() -> Narrative {
    let text = "No journey is ongoing right now.".to_string();
    Narrative {
        blocks: vec![json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": text }
        })],
        fallback: text,
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Unauthorized)
}

/// Decode an `application/x-www-form-urlencoded` body.
fn parse_form(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let decode = |raw: &str| {
                urlencoding::decode(&raw.replace('+', " "))
                    .map(|cow| cow.into_owned())
                    .ok()
            };
            Some((decode(key)?, decode(value)?))
        })
        .collect()
}
