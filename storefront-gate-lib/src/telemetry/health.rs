use hyper::Response;
use hyper::StatusCode;
use serde_json::json;

use crate::error::Result;
use crate::gate::response::{json_response, RespBody};

/// Health check response - always returns 200 if process is running
pub fn health_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, &json!({"status": "healthy"}))
}

/// Readiness check - verifies that an upstream is configured
/// Returns 200 if an upstream address is set, 503 otherwise
pub fn ready_check_response(upstream: &str) -> Result<Response<RespBody>> {
    if upstream.trim().is_empty() {
        json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({
                "status": "not_ready",
                "reason": "no_upstream_configured"
            }),
        )
    } else {
        json_response(StatusCode::OK, &json!({"status": "ready"}))
    }
}

/// Liveness check - always returns 200 if process is running
pub fn live_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, &json!({"status": "alive"}))
}
