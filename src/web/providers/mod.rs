// Provider dispatch for the chat relay.
//
// Each backend turns a message list plus a clamped output budget into
// generated text. The trait keeps the route handler free of per-backend
// request building and response normalization, so clamping and error
// wrapping live in exactly one place.

pub mod finetuned;
pub mod openai;

use std::time::Duration;

use hyper::StatusCode;
use thiserror::Error;

use super::config::RelayConfig;
use super::models::{ChatMessage, ProviderKind};

pub use finetuned::FinetunedProvider;
pub use openai::OpenAiProvider;

/// Timeout applied to every outbound provider call.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required endpoint or credential is missing from the configuration.
    #[error("{0}")]
    Config(String),
    /// The upstream provider answered with a non-success status.
    #[error("{provider} error: {status} {body}")]
    Upstream {
        provider: &'static str,
        status: u16,
        body: String,
    },
    /// The upstream provider could not be reached, or answered garbage.
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProviderError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ProviderError::Upstream { .. } | ProviderError::Transport { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Turn the message list into generated text, spending at most
    /// `max_new_tokens` of output budget. The budget arrives pre-clamped.
    fn generate(
        &self,
        messages: &[ChatMessage],
        max_new_tokens: u32,
    ) -> Result<String, ProviderError>;
}

/// Instantiate the provider selected for this request. Fails with a
/// configuration error when the backend's endpoint or credential is absent.
pub fn create_provider(
    kind: ProviderKind,
    config: &RelayConfig,
) -> Result<Box<dyn Provider>, ProviderError> {
    match kind {
        ProviderKind::Finetuned => Ok(Box::new(FinetunedProvider::new(config)?)),
        ProviderKind::Openai => Ok(Box::new(OpenAiProvider::new(config)?)),
    }
}
