use thiserror::Error;

/// Errors that can occur in the gateway
#[derive(Error, Debug)]
pub enum GateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream did not answer within {0:?}")]
    UpstreamTimeout(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, GateError>;
