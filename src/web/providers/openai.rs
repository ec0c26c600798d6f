// OpenAI chat-completions provider.
//
// Messages are already role/content shaped, so they pass through unmodified;
// only the output budget and a fixed temperature are added.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{Provider, ProviderError, UPSTREAM_TIMEOUT};
use crate::web::config::RelayConfig;
use crate::web::models::ChatMessage;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const TEMPERATURE: f64 = 0.2;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiProvider {
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiProvider {
    pub fn new(config: &RelayConfig) -> Result<Self, ProviderError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| ProviderError::Config("OPENAI_API_KEY missing".to_string()))?;
        Ok(Self {
            api_key,
            model: config.openai_model.clone(),
            url: OPENAI_API_URL.to_string(),
        })
    }
}

pub fn build_payload(model: &str, messages: &[ChatMessage], max_new_tokens: u32) -> Value {
    json!({
        "model": model,
        "messages": messages,
        "temperature": TEMPERATURE,
        "max_tokens": max_new_tokens,
    })
}

/// First choice's message content, defaulting to empty string.
fn extract_content(response: ChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default()
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn generate(
        &self,
        messages: &[ChatMessage],
        max_new_tokens: u32,
    ) -> Result<String, ProviderError> {
        let payload = build_payload(&self.model, messages, max_new_tokens);

        let request = ureq::post(&self.url)
            .timeout(UPSTREAM_TIMEOUT)
            .set("content-type", "application/json")
            .set("authorization", &format!("Bearer {}", self.api_key));

        let response = match request.send_string(&payload.to_string()) {
            Ok(resp) => resp,
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(ProviderError::Upstream {
                    provider: self.name(),
                    status,
                    body,
                });
            }
            Err(e) => {
                return Err(ProviderError::Transport {
                    provider: self.name(),
                    message: e.to_string(),
                });
            }
        };

        let body = response.into_string().map_err(|e| ProviderError::Transport {
            provider: self.name(),
            message: format!("Failed to read response: {e}"),
        })?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Transport {
                provider: self.name(),
                message: format!("Failed to parse response: {e}"),
            })?;

        Ok(extract_content(parsed))
    }
}
