// Health check route handler

use std::convert::Infallible;
use std::sync::Arc;

use hyper::{Body, Response, StatusCode};

use crate::web::config::RelayConfig;
use crate::web::response_helpers::json_raw;

pub async fn handle(config: Arc<RelayConfig>) -> Result<Response<Body>, Infallible> {
    Ok(json_raw(
        StatusCode::OK,
        serde_json::json!({
            "status": "ok",
            "service": "domain-chat-router",
            "provider_default": config.provider_default.as_str(),
        })
        .to_string(),
    ))
}
