// Request parsing utilities for HTTP handlers

use hyper::{Body, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::response_helpers::json_error;
use crate::{sys_debug, sys_error};

/// Parse a JSON request body into a typed structure.
///
/// Returns the deserialized value on success, or a ready-to-send error
/// Response (JSON body, CORS headers) on failure.
pub async fn parse_json_body<T: DeserializeOwned>(body: Body) -> Result<T, Response<Body>> {
    let body_bytes = match hyper::body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(e) => {
            sys_error!("[REQUEST] Failed to read request body: {}", e);
            return Err(json_error(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ));
        }
    };

    // Debug: log the received JSON for troubleshooting
    if let Ok(body_str) = std::str::from_utf8(&body_bytes) {
        if !body_str.is_empty() {
            sys_debug!("[REQUEST] Body: {}", body_str);
        }
    }

    match serde_json::from_slice::<T>(&body_bytes) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            sys_error!("[REQUEST] JSON parsing error: {}", e);
            Err(json_error(StatusCode::BAD_REQUEST, "Invalid JSON format"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::models::ChatRequest;

    #[tokio::test]
    async fn test_parse_valid_chat_request() {
        let body = Body::from(
            r#"{"messages":[{"role":"user","content":"hello"}],"max_new_tokens":512}"#,
        );
        let parsed: ChatRequest = parse_json_body(body).await.unwrap();
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.max_new_tokens, Some(512.0));
    }

    #[tokio::test]
    async fn test_parse_invalid_json_yields_bad_request() {
        let body = Body::from("{not json");
        let result: Result<ChatRequest, _> = parse_json_body(body).await;
        let response = result.err().unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
