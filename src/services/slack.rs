// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Slack client for posting messages and verifying slash-command requests.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Slash-command requests older than this are rejected as replays.
pub const MAX_REQUEST_AGE_SECS: i64 = 300;

/// Slack Web API client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

impl SlackClient {
    pub fn new(bot_token: String) -> Self {
        Self::with_base_url(bot_token, "https://slack.com/api".to_string())
    }

    /// Client pointed at a non-default API host, for tests and staging.
    pub fn with_base_url(bot_token: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            bot_token,
        }
    }

    /// Post a block message to a channel.
    pub async fn post_message(
        &self,
        channel: &str,
        blocks: &[Value],
        fallback: &str,
    ) -> Result<()> {
        let body = serde_json::json!({
            "channel": channel,
            "text": fallback,
            "blocks": blocks,
        });

        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.bot_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Chat(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Chat(format!("HTTP {status}: {text}")));
        }

        let parsed: PostMessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::Chat(format!("JSON parse error: {e}")))?;
        if !parsed.ok {
            return Err(AppError::Chat(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        tracing::debug!(channel, "Message posted");
        Ok(())
    }
}

/// Verify a slash-command request signature (`v0` scheme).
///
/// The signature covers `v0:{timestamp}:{raw body}` with HMAC-SHA256 under
/// the workspace signing secret. Comparison is constant-time.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: &str,
    body: &str,
    signature: &str,
) -> bool {
    let base = format!("v0:{timestamp}:{body}");
    let mut mac = match HmacSha256::new_from_slice(signing_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(base.as_bytes());
    let expected = format!("v0={}", hex::encode(mac.finalize().into_bytes()));
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Check that a request timestamp is within the replay window.
pub fn timestamp_fresh(timestamp: &str, now_epoch_secs: i64) -> bool {
    match timestamp.parse::<i64>() {
        Ok(ts) => (now_epoch_secs - ts).abs() <= MAX_REQUEST_AGE_SECS,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference request from the signing documentation.
    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const TIMESTAMP: &str = "1531420618";
    const BODY: &str = "token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmb4JCLq4K9GRylV8H2&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
    const SIGNATURE: &str = "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503";

    #[test]
    fn test_verify_signature_accepts_reference_vector() {
        assert!(verify_signature(SECRET, TIMESTAMP, BODY, SIGNATURE));
    }

    #[test]
    fn test_verify_signature_rejects_tampering() {
        let tampered_body = BODY.replace("roadrunner", "coyote");
        assert!(!verify_signature(SECRET, TIMESTAMP, &tampered_body, SIGNATURE));
        assert!(!verify_signature(SECRET, "1531420619", BODY, SIGNATURE));
        assert!(!verify_signature("wrong_secret", TIMESTAMP, BODY, SIGNATURE));
        assert!(!verify_signature(SECRET, TIMESTAMP, BODY, "v0=deadbeef"));
    }

    #[test]
    fn test_timestamp_freshness() {
        assert!(timestamp_fresh("1000000000", 1_000_000_000));
        assert!(timestamp_fresh("1000000000", 1_000_000_000 + MAX_REQUEST_AGE_SECS));
        assert!(!timestamp_fresh("1000000000", 1_000_000_000 + MAX_REQUEST_AGE_SECS + 1));
        assert!(!timestamp_fresh("not-a-number", 1_000_000_000));
    }
}
