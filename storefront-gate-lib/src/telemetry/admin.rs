use hyper::Response;
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::admission::AdmissionController;
use crate::error::Result;
use crate::gate::response::{json_response, RespBody};

/// Largest accepted admin request body
pub const MAX_ADMIN_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, Deserialize)]
struct ClearKeyRequest {
    key: String,
}

/// `POST /admin/rate-limit/clear` with `{"key": "..."}`
pub fn clear_key_response(
    body: &[u8],
    controller: &AdmissionController,
) -> Result<Response<RespBody>> {
    let request: ClearKeyRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => return bad_request(&format!("Invalid request body: {e}")),
    };

    let cleared = controller.clear_buckets_for_key(&request.key);
    info!(key = %request.key, cleared, "Rate limit buckets cleared for key");
    json_response(StatusCode::OK, &json!({"cleared": cleared}))
}

/// `POST /admin/rate-limit/clear-all`
pub fn clear_all_response(controller: &AdmissionController) -> Result<Response<RespBody>> {
    let cleared = controller.clear_all_buckets();
    info!(cleared, "All rate limit buckets cleared");
    json_response(StatusCode::OK, &json!({"cleared": cleared}))
}

pub fn bad_request(message: &str) -> Result<Response<RespBody>> {
    json_response(StatusCode::BAD_REQUEST, &json!({"error": "Bad Request", "message": message}))
}

pub fn method_not_allowed() -> Result<Response<RespBody>> {
    let mut resp = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &json!({"error": "Method Not Allowed", "message": "Use POST"}),
    )?;
    resp.headers_mut()
        .insert(hyper::header::ALLOW, hyper::header::HeaderValue::from_static("POST"));
    Ok(resp)
}
