// Relay limits route handler.
//
// Exposes the budget ceilings so clients can display them and pre-clamp
// their requests. No credentials or endpoint URLs leave the server.

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Response, StatusCode};
use serde::Serialize;

use crate::web::config::RelayConfig;
use crate::web::models::MAX_NEW_TOKENS_FLOOR;
use crate::web::response_helpers::json_response;

#[derive(Serialize)]
struct LimitsPayload<'a> {
    provider_default: &'a str,
    max_new_tokens_floor: u32,
    max_new_tokens_limit: u32,
    /// Input + output must fit in this many tokens. Advertised for display;
    /// the relay itself only clamps the output budget.
    context_tokens_limit: u32,
}

pub async fn handle(config: Arc<RelayConfig>) -> Result<Response<Body>, Infallible> {
    let payload = LimitsPayload {
        provider_default: config.provider_default.as_str(),
        max_new_tokens_floor: MAX_NEW_TOKENS_FLOOR,
        max_new_tokens_limit: config.max_new_tokens_limit,
        context_tokens_limit: config.context_tokens_limit,
    };
    Ok(json_response(StatusCode::OK, &payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limits_payload() {
        let config = Arc::new(RelayConfig {
            max_new_tokens_limit: 768,
            ..RelayConfig::default()
        });
        let response = handle(config).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["max_new_tokens_limit"], 768);
        assert_eq!(parsed["max_new_tokens_floor"], 16);
        assert_eq!(parsed["context_tokens_limit"], 4096);
        assert!(parsed.get("openai_api_key").is_none());
    }
}
