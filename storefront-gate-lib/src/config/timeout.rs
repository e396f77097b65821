use serde::Deserialize;

/// Timeout configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    /// Upstream connection timeout in milliseconds
    /// Default: 5000 (5 seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,
    /// Maximum time to wait for the upstream to answer a forwarded request, in seconds
    /// Expired requests are answered with 504 Gateway Timeout
    /// Default: 30
    #[serde(default = "default_upstream_timeout")]
    pub upstream_secs: u64,
    /// Graceful shutdown timeout in seconds
    /// Time given to in-flight connections after SIGTERM/SIGINT
    /// Default: 30
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_secs: u64,
    /// Upstream keep-alive configuration
    #[serde(default)]
    pub keep_alive: KeepAliveConfig,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            upstream_secs: default_upstream_timeout(),
            shutdown_secs: default_shutdown_timeout(),
            keep_alive: KeepAliveConfig::default(),
        }
    }
}

/// Keep-alive for pooled upstream connections
#[derive(Debug, Deserialize, Clone)]
pub struct KeepAliveConfig {
    /// Enable TCP keep-alive on upstream connections
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Keep-alive timeout in seconds, also used as the idle timeout of pooled connections
    /// Default: 60 seconds
    #[serde(default = "default_keep_alive_timeout")]
    pub timeout_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self { enabled: true, timeout_secs: default_keep_alive_timeout() }
    }
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_keep_alive_timeout() -> u64 {
    60
}
