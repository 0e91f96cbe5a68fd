// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Image store client.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Narrow interface to the image store collaborator.
pub trait ImageStore {
    /// Upload image bytes to `path`; returns the public URL.
    fn upload(
        &self,
        bytes: &[u8],
        path: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// HTTP client for the image store.
#[derive(Clone)]
pub struct ImageStoreClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl ImageStoreClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        }
    }
}

impl ImageStore for ImageStoreClient {
    async fn upload(&self, bytes: &[u8], path: &str) -> Result<String> {
        let body = serde_json::json!({
            "path": path,
            "content": BASE64.encode(bytes),
        });

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ImageStore(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ImageStore(format!("HTTP {status}: {text}")));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageStore(format!("JSON parse error: {e}")))?;
        Ok(uploaded.url)
    }
}
