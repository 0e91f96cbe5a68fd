// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reverse geocoding and nearby point-of-interest lookups.

use serde::Deserialize;

use crate::error::{AppError, Result};

/// A reverse-geocoded position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub address: String,
    pub country: Option<String>,
}

/// A nearby point of interest.
#[derive(Debug, Clone)]
pub struct PointOfInterest {
    pub name: String,
    pub photo: Option<Vec<u8>>,
}

/// Narrow interface to the geocoding/places collaborator.
pub trait GeoLookup {
    fn reverse_geocode(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl std::future::Future<Output = Result<Option<ResolvedAddress>>> + Send;

    fn nearby_point_of_interest(
        &self,
        lat: f64,
        lon: f64,
    ) -> impl std::future::Future<Output = Result<Option<PointOfInterest>>> + Send;
}

/// HTTP client for the geocoding/places service.
#[derive(Clone)]
pub struct GeoClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted: String,
    components: GeocodeComponents,
}

#[derive(Debug, Deserialize)]
struct GeocodeComponents {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResponse {
    name: Option<String>,
    photo_url: Option<String>,
}

impl GeoClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::GeoLookup(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::GeoLookup(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GeoLookup(format!("JSON parse error: {e}")))
    }
}

impl GeoLookup for GeoClient {
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Option<ResolvedAddress>> {
        let query = urlencoding::encode(&format!("{lat},{lon}")).into_owned();
        let url = format!(
            "{}/geocode/v1/json?q={}&key={}&no_annotations=1&limit=1",
            self.base_url, query, self.api_key
        );
        let response: GeocodeResponse = self.get_json(&url).await?;
        Ok(response.results.into_iter().next().map(|r| ResolvedAddress {
            address: r.formatted,
            country: r.components.country,
        }))
    }

    async fn nearby_point_of_interest(&self, lat: f64, lon: f64) -> Result<Option<PointOfInterest>> {
        let url = format!(
            "{}/places/v1/nearby?lat={lat}&lon={lon}&key={}",
            self.base_url, self.api_key
        );
        let place: PlaceResponse = self.get_json(&url).await?;
        let Some(name) = place.name else {
            return Ok(None);
        };

        // The photo is decorative; a failed fetch only drops the picture.
        let photo = match place.photo_url {
            Some(photo_url) => match self.http.get(&photo_url).send().await {
                Ok(response) if response.status().is_success() => {
                    response.bytes().await.ok().map(|b| b.to_vec())
                }
                Ok(response) => {
                    tracing::warn!(status = %response.status(), "Place photo fetch failed");
                    None
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Place photo fetch failed");
                    None
                }
            },
            None => None,
        };

        Ok(Some(PointOfInterest { name, photo }))
    }
}
