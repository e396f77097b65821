use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use http::StatusCode;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::Response;
use serde_json::json;

use crate::error::{GateError, Result};

pub type RespBody = BoxBody<Bytes, hyper::Error>;

pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-rate-limit-remaining");

pub const REJECTION_ERROR: &str = "Rate limit exceeded";
pub const REJECTION_MESSAGE: &str = "Too many requests. Please try again later.";

pub fn full_body(data: impl Into<Bytes>) -> RespBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> RespBody {
    full_body(Bytes::new())
}

/// Build a JSON response with the given status
pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Result<Response<RespBody>> {
    let bytes = serde_json::to_vec(body)
        .map_err(|e| GateError::Http(format!("Failed to serialize response body: {e}")))?;

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(full_body(bytes))
        .map_err(|e| GateError::Http(format!("Failed to build response: {e}")))
}

/// 429 answer for a request whose bucket is empty
///
/// `retry_after` is rounded up to whole seconds, never below one.
pub fn rejection_response(retry_after: Duration) -> Response<RespBody> {
    let body = json!({
        "error": REJECTION_ERROR,
        "message": REJECTION_MESSAGE,
    });
    let mut resp = match json_response(StatusCode::TOO_MANY_REQUESTS, &body) {
        Ok(resp) => resp,
        Err(_) => {
            let mut resp = Response::new(full_body(REJECTION_ERROR));
            *resp.status_mut() = StatusCode::TOO_MANY_REQUESTS;
            resp
        }
    };

    let headers = resp.headers_mut();
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs(retry_after)));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from_static("0"));
    resp
}

/// Attach the remaining token count to a forwarded response
pub fn annotate_remaining<B>(resp: &mut Response<B>, remaining: u64) {
    resp.headers_mut()
        .insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
}

/// Build HTTP response with status code of 4xx and 5xx
pub fn synthetic_error_response(status_code: StatusCode) -> Response<RespBody> {
    let mut resp = Response::new(empty_body());
    *resp.status_mut() = status_code;
    resp
}

pub(crate) fn retry_after_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs();
    let rounded = if wait.subsec_nanos() > 0 { secs.saturating_add(1) } else { secs };
    rounded.max(1)
}
