// HTTP client for the relay.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::continuation::{AskBackend, RoundResult};
use crate::web::models::{ChatMessage, ProviderKind, RelayReply};

/// Client-side ceiling on one relay round trip. Slightly above the relay's
/// own upstream timeout so the relay's error wins the race.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay answered with its error variant.
    #[error("{0}")]
    Relay(String),
    /// The relay could not be reached or answered something unreadable.
    #[error("request failed: {0}")]
    Transport(String),
}

/// Payload of `GET /api/config`.
#[derive(Debug, Deserialize)]
pub struct RelayLimits {
    pub provider_default: String,
    pub max_new_tokens_floor: u32,
    pub max_new_tokens_limit: u32,
    pub context_tokens_limit: u32,
}

pub struct RelayClient {
    base_url: String,
    provider: Option<ProviderKind>,
    max_new_tokens: u32,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, provider: Option<ProviderKind>, max_new_tokens: u32) -> Self {
        Self {
            base_url: base_url.into(),
            provider,
            max_new_tokens,
        }
    }

    /// Fetch the relay's advertised limits so the UI can display them and
    /// pre-clamp its requests.
    pub fn fetch_limits(base_url: &str) -> Result<RelayLimits, ClientError> {
        let url = format!("{}/api/config", base_url.trim_end_matches('/'));
        let response = ureq::get(&url)
            .timeout(REQUEST_TIMEOUT)
            .call()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let body = response
            .into_string()
            .map_err(|e| ClientError::Transport(format!("Failed to read response: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::Transport(format!("Failed to parse limits: {e}")))
    }

    /// One relay round trip. Returns the assistant text, or the error the
    /// relay reported for this submission.
    pub fn chat(&self, messages: &[ChatMessage]) -> Result<String, ClientError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "messages": messages,
            "max_new_tokens": self.max_new_tokens,
        });

        let mut request = ureq::post(&url)
            .timeout(REQUEST_TIMEOUT)
            .set("content-type", "application/json");
        if let Some(provider) = self.provider {
            request = request.set("x-llm", provider.as_str());
        }

        let body = match request.send_string(&payload.to_string()) {
            Ok(response) => response
                .into_string()
                .map_err(|e| ClientError::Transport(format!("Failed to read response: {e}")))?,
            Err(ureq::Error::Status(status, response)) => {
                let status_text = response.status_text().to_string();
                let body = response.into_string().unwrap_or_default();
                // The relay reports its own failures as JSON error bodies on
                // 4xx/5xx; anything else is a transport-level problem.
                if let Ok(RelayReply::Failure { error }) = serde_json::from_str(&body) {
                    return Err(ClientError::Relay(error));
                }
                return Err(ClientError::Transport(format!(
                    "{status} {status_text} {body}"
                )));
            }
            Err(e) => return Err(ClientError::Transport(e.to_string())),
        };

        match serde_json::from_str::<RelayReply>(&body) {
            Ok(RelayReply::Success { text, .. }) => Ok(text),
            Ok(RelayReply::Failure { error }) => Err(ClientError::Relay(error)),
            Err(e) => Err(ClientError::Transport(format!(
                "Unexpected relay response: {e}"
            ))),
        }
    }
}

impl AskBackend for RelayClient {
    fn ask(&self, prompt: &str) -> Result<RoundResult, ClientError> {
        let messages = [ChatMessage::user(prompt)];
        let text = self.chat(&messages)?;
        // The relay contract carries no finish reason; the continuation
        // loop's sentence heuristic decides alone.
        Ok(RoundResult {
            text,
            finish_reason: None,
        })
    }
}
