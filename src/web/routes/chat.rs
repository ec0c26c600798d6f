// Chat relay route handler.
//
// One inbound request maps to at most one outbound provider call: parse,
// resolve the provider from the x-llm header, clamp the budget, dispatch,
// normalize. Upstream failures come back as structured errors; the relay
// never retries.

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Request, Response, StatusCode};
use tokio::task::spawn_blocking;

use crate::web::config::RelayConfig;
use crate::web::models::{clamp_max_new_tokens, ChatRequest, ProviderKind, RelayReply};
use crate::web::providers::create_provider;
use crate::web::request_parsing::parse_json_body;
use crate::web::response_helpers::{json_error, json_response};
use crate::{sys_error, sys_info};

pub async fn handle(
    req: Request<Body>,
    config: Arc<RelayConfig>,
) -> Result<Response<Body>, Infallible> {
    // Read the provider selector before the body consumes the request
    let provider_header = req
        .headers()
        .get("x-llm")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let chat_request: ChatRequest = match parse_json_body(req.into_body()).await {
        Ok(parsed) => parsed,
        Err(error_response) => return Ok(error_response),
    };

    let kind = ProviderKind::resolve(provider_header.as_deref(), config.provider_default);
    let max_new_tokens =
        clamp_max_new_tokens(chat_request.max_new_tokens, config.max_new_tokens_limit);
    sys_info!(
        "[CHAT] provider={} max_new_tokens={} messages={}",
        kind.as_str(),
        max_new_tokens,
        chat_request.messages.len()
    );

    // ureq is blocking; keep the upstream call off the runtime threads
    let task_config = config.clone();
    let messages = chat_request.messages;
    let outcome = spawn_blocking(move || {
        let provider = create_provider(kind, &task_config)?;
        provider.generate(&messages, max_new_tokens)
    })
    .await;

    match outcome {
        Ok(Ok(text)) => Ok(json_response(
            StatusCode::OK,
            &RelayReply::Success {
                provider: kind.as_str().to_string(),
                text,
            },
        )),
        Ok(Err(e)) => {
            sys_error!("[CHAT] {} request failed: {}", kind.as_str(), e);
            Ok(json_error(e.status_code(), &e.to_string()))
        }
        Err(e) => Ok(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Task failed: {e}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_request(body: &str, provider: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/api/chat");
        if let Some(p) = provider {
            builder = builder.header("x-llm", p);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn error_body(response: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        parsed["error"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_500_not_silent_success() {
        let config = Arc::new(RelayConfig::default());
        let req = chat_request(r#"{"messages":[{"role":"user","content":"hi"}]}"#, None);
        let response = handle(req, config).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_body(response).await, "HF_INFERENCE_URL not set");
    }

    #[tokio::test]
    async fn test_header_selects_openai_and_reports_its_config_error() {
        let config = Arc::new(RelayConfig::default());
        let req = chat_request(r#"{"messages":[]}"#, Some("openai"));
        let response = handle(req, config).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_body(response).await, "OPENAI_API_KEY missing");
    }

    #[tokio::test]
    async fn test_unrecognized_header_falls_back_to_default() {
        let config = Arc::new(RelayConfig {
            provider_default: ProviderKind::Openai,
            ..RelayConfig::default()
        });
        let req = chat_request(r#"{"messages":[]}"#, Some("mystery"));
        let response = handle(req, config).await.unwrap();
        // Default is openai, whose key is missing in this config
        assert_eq!(error_body(response).await, "OPENAI_API_KEY missing");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let config = Arc::new(RelayConfig::default());
        let req = chat_request("{not json", None);
        let response = handle(req, config).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
