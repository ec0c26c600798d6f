// Environment-sourced relay configuration.
//
// Built once at startup and passed into the handlers, so tests can construct
// arbitrary configs without touching the process environment.

use std::env;

use super::models::ProviderKind;

/// Server-enforced ceiling on `max_new_tokens` when the env leaves it unset.
pub const DEFAULT_MAX_NEW_TOKENS_LIMIT: u32 = 1024;

/// Advertised total-context ceiling (input + output). Informational: clients
/// display it, the relay does not enforce it.
pub const DEFAULT_CONTEXT_TOKENS_LIMIT: u32 = 4096;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Self-hosted inference endpoint, e.g. a dedicated HF endpoint URL.
    pub hf_inference_url: Option<String>,
    /// Bearer token for the self-hosted endpoint, if it requires one.
    pub hf_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub provider_default: ProviderKind,
    pub max_new_tokens_limit: u32,
    pub context_tokens_limit: u32,
    pub port: u16,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let provider_default = env::var("PROVIDER_DEFAULT")
            .ok()
            .and_then(|v| ProviderKind::parse(&v))
            .unwrap_or(ProviderKind::Finetuned);

        Self {
            hf_inference_url: non_empty_var("HF_INFERENCE_URL"),
            hf_token: non_empty_var("HF_TOKEN"),
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: non_empty_var("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            provider_default,
            max_new_tokens_limit: parsed_var("MAX_NEW_TOKENS_LIMIT")
                .unwrap_or(DEFAULT_MAX_NEW_TOKENS_LIMIT),
            context_tokens_limit: parsed_var("CONTEXT_TOKENS_LIMIT")
                .unwrap_or(DEFAULT_CONTEXT_TOKENS_LIMIT),
            port: parsed_var("PORT").unwrap_or(DEFAULT_PORT),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            hf_inference_url: None,
            hf_token: None,
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            provider_default: ProviderKind::Finetuned,
            max_new_tokens_limit: DEFAULT_MAX_NEW_TOKENS_LIMIT,
            context_tokens_limit: DEFAULT_CONTEXT_TOKENS_LIMIT,
            port: DEFAULT_PORT,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.provider_default, ProviderKind::Finetuned);
        assert_eq!(config.max_new_tokens_limit, 1024);
        assert_eq!(config.context_tokens_limit, 4096);
        assert!(config.hf_inference_url.is_none());
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_model, "gpt-4o-mini");
    }
}
