use http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::telemetry::metrics::values;

/// HTTP result type, T is typically a hyper::Response
/// HttpError is used to generate a synthetic error response
pub(crate) type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong while forwarding an admitted request
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Failed to get response from upstream: {0}")]
    FailedToGetResponseFromUpstream(String),

    #[error("Upstream did not answer within {0:?}")]
    UpstreamTimeout(Duration),
}

impl HttpError {
    /// Metric label for this error
    pub fn error_type(&self) -> &'static str {
        match self {
            HttpError::InvalidUri(_) => "invalid_uri",
            HttpError::FailedToGetResponseFromUpstream(_) => values::ERROR_UPSTREAM,
            HttpError::UpstreamTimeout(_) => values::ERROR_UPSTREAM_TIMEOUT,
        }
    }
}

impl From<HttpError> for StatusCode {
    fn from(e: HttpError) -> StatusCode {
        match e {
            HttpError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            HttpError::FailedToGetResponseFromUpstream(_) => StatusCode::BAD_GATEWAY,
            HttpError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<HttpError> for crate::error::GateError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::UpstreamTimeout(d) => crate::error::GateError::UpstreamTimeout(d),
            HttpError::InvalidUri(s) => crate::error::GateError::Http(s),
            HttpError::FailedToGetResponseFromUpstream(s) => crate::error::GateError::Upstream(s),
        }
    }
}
