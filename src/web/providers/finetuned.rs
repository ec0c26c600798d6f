// Self-hosted fine-tuned endpoint provider.
//
// The endpoint speaks the text-generation-inference shape: a flattened
// prompt string in, `generated_text` out (either a one-element sequence or a
// bare object, depending on deployment).

use serde_json::{json, Value};

use super::{Provider, ProviderError, UPSTREAM_TIMEOUT};
use crate::web::config::RelayConfig;
use crate::web::models::ChatMessage;
use crate::web::scrub::scrub_generated_text;

const TEMPERATURE: f64 = 0.2;
const TOP_P: f64 = 0.9;
const REPETITION_PENALTY: f64 = 1.1;

/// Role markers the flattened prompt can teach the model to emit. The
/// endpoint's stop slot holds only a handful of sequences, so this is a
/// fixed set, not something derived from the conversation.
const STOP_SEQUENCES: [&str; 4] = ["\nuser:", "\nUser:", "\nsystem:", "\nSystem:"];

pub struct FinetunedProvider {
    url: String,
    token: Option<String>,
}

impl FinetunedProvider {
    pub fn new(config: &RelayConfig) -> Result<Self, ProviderError> {
        let url = config
            .hf_inference_url
            .clone()
            .ok_or_else(|| ProviderError::Config("HF_INFERENCE_URL not set".to_string()))?;
        Ok(Self {
            url,
            token: config.hf_token.clone(),
        })
    }
}

/// Render the history as "role: content" lines with a trailing "assistant:"
/// cue so the backend knows where to continue.
pub fn flatten_messages(messages: &[ChatMessage]) -> String {
    let mut parts: Vec<String> = messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect();
    parts.push("assistant:".to_string());
    parts.join("\n")
}

pub fn build_payload(messages: &[ChatMessage], max_new_tokens: u32) -> Value {
    json!({
        "inputs": flatten_messages(messages),
        "parameters": {
            "max_new_tokens": max_new_tokens,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
            "do_sample": true,
            "repetition_penalty": REPETITION_PENALTY,
            "stop": STOP_SEQUENCES,
        },
    })
}

/// Normalize the endpoint's tolerated return shapes to a single string:
/// first element's generated text if sequence-shaped, else the object's
/// generated-text field, else empty string.
pub fn extract_generated_text(value: &Value) -> String {
    let field = match value {
        Value::Array(items) => items.first().and_then(|item| item.get("generated_text")),
        Value::Object(_) => value.get("generated_text"),
        _ => None,
    };
    field.and_then(Value::as_str).unwrap_or_default().to_string()
}

impl Provider for FinetunedProvider {
    fn name(&self) -> &'static str {
        "finetuned"
    }

    fn generate(
        &self,
        messages: &[ChatMessage],
        max_new_tokens: u32,
    ) -> Result<String, ProviderError> {
        let payload = build_payload(messages, max_new_tokens);

        let mut request = ureq::post(&self.url)
            .timeout(UPSTREAM_TIMEOUT)
            .set("content-type", "application/json");
        if let Some(token) = &self.token {
            request = request.set("authorization", &format!("Bearer {token}"));
        }

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
        let value: Value = serde_json::from_str(&body).map_err(|e| ProviderError::Transport {
            provider: self.name(),
            message: format!("Failed to parse response: {e}"),
        })?;

        Ok(scrub_generated_text(&extract_generated_text(&value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::models::{ChatMessage, Role};

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("Be terse."),
            ChatMessage::user("What is 6 times 7?"),
        ]
    }

    #[test]
    fn test_flatten_renders_roles_and_cue() {
        let prompt = flatten_messages(&history());
        assert_eq!(prompt, "system: Be terse.\nuser: What is 6 times 7?\nassistant:");
    }

    #[test]
    fn test_flatten_empty_history_is_just_the_cue() {
        assert_eq!(flatten_messages(&[]), "assistant:");
    }

    #[test]
    fn test_payload_carries_clamped_budget_and_stops() {
        let payload = build_payload(&history(), 256);
        assert_eq!(payload["parameters"]["max_new_tokens"], 256);
        assert_eq!(payload["parameters"]["do_sample"], true);
        let stops = payload["parameters"]["stop"].as_array().unwrap();
        assert_eq!(stops.len(), 4);
        assert!(stops.iter().any(|s| s == "\nUser:"));
        assert!(payload["inputs"].as_str().unwrap().ends_with("\nassistant:"));
    }

    #[test]
    fn test_extract_from_sequence_shape() {
        let value = serde_json::json!([{ "generated_text": "hello" }]);
        assert_eq!(extract_generated_text(&value), "hello");
    }

    #[test]
    fn test_extract_from_object_shape() {
        let value = serde_json::json!({ "generated_text": "hello" });
        assert_eq!(extract_generated_text(&value), "hello");
    }

    #[test]
    fn test_extract_empty_sequence_is_empty_not_error() {
        let value = serde_json::json!([]);
        assert_eq!(extract_generated_text(&value), "");
    }

    #[test]
    fn test_extract_unexpected_shape_is_empty() {
        assert_eq!(extract_generated_text(&serde_json::json!("plain")), "");
        assert_eq!(extract_generated_text(&serde_json::json!(42)), "");
        assert_eq!(extract_generated_text(&serde_json::json!({"other": 1})), "");
    }

    #[test]
    fn test_role_enum_serializes_lowercase_into_prompt() {
        let msg = ChatMessage { role: Role::Assistant, content: "prior".into() };
        let prompt = flatten_messages(&[msg]);
        assert!(prompt.starts_with("assistant: prior"));
    }
}
