use serde::Deserialize;
use std::net::SocketAddr;

use super::auth::AuthConfig;
use super::rules::RouteRules;
use super::telemetry::{LoggingConfig, TelemetryConfig};
use super::timeout::TimeoutConfig;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Address and port to listen on
    /// Example: "0.0.0.0:8080" or "127.0.0.1:8080"
    pub listen: SocketAddr,
    /// Business-logic backend that admitted requests are forwarded to (host:port format)
    /// Example: "storefront-api:9000" or "127.0.0.1:9000"
    pub upstream: String,
    /// Traffic classification paths
    #[serde(default)]
    pub rules: RouteRules,
    /// Identity propagation
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Timeout configuration
    #[serde(default)]
    pub timeout: TimeoutConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
