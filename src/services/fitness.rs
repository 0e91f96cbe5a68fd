// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step-data provider client.
//!
//! Handles:
//! - Listing participants with step tracking enabled
//! - Fetching one person's step count for a given day
//! - Fetching one person's body metrics for a given day

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Person;
use crate::time_utils::format_date;

/// Weight and body-fat reading for one person and day.
#[derive(Debug, Clone, Deserialize)]
pub struct BodyMetrics {
    pub weight_kg: Option<f64>,
    pub fat_percent: Option<f64>,
}

/// Narrow interface to the step-data provider, so the daily update can be
/// driven by a fake in tests.
pub trait StepSource {
    /// Participants with step tracking enabled.
    fn enabled_participants(&self) -> impl std::future::Future<Output = Result<Vec<Person>>> + Send;

    /// Step count for one person and day. `None` when the provider has no
    /// data for that day.
    fn steps_for(
        &self,
        person: &Person,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Option<u32>>> + Send;

    /// Body metrics for one person and day, when recorded.
    fn body_metrics_for(
        &self,
        person: &Person,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Option<BodyMetrics>>> + Send;
}

/// HTTP client for the step-data provider.
#[derive(Clone)]
pub struct StepProviderClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ParticipantDto {
    id: i64,
    first_name: String,
    color: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StepsDto {
    steps: Option<u32>,
}

impl StepProviderClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::StepProvider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::StepProvider(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StepProvider(format!("JSON parse error: {e}")))
    }
}

impl StepSource for StepProviderClient {
    async fn enabled_participants(&self) -> Result<Vec<Person>> {
        let url = format!("{}/participants?enabled=true", self.base_url);
        let participants: Vec<ParticipantDto> = self.get_json(&url).await?;
        Ok(participants
            .into_iter()
            .map(|p| Person {
                id: p.id,
                first_name: p.first_name,
                color_hex: p.color,
            })
            .collect())
    }

    async fn steps_for(&self, person: &Person, date: NaiveDate) -> Result<Option<u32>> {
        let url = format!(
            "{}/participants/{}/steps?date={}",
            self.base_url,
            person.id,
            format_date(date)
        );
        let dto: StepsDto = self.get_json(&url).await?;
        Ok(dto.steps)
    }

    async fn body_metrics_for(
        &self,
        person: &Person,
        date: NaiveDate,
    ) -> Result<Option<BodyMetrics>> {
        let url = format!(
            "{}/participants/{}/body?date={}",
            self.base_url,
            person.id,
            format_date(date)
        );
        let metrics: Option<BodyMetrics> = self.get_json(&url).await?;
        Ok(metrics)
    }
}
