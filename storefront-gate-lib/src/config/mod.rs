mod auth;
mod loader;
mod root;
mod rules;
mod telemetry;
mod timeout;

pub use auth::AuthConfig;
pub use loader::{load_from_path, load_from_str, validate_config};
pub use root::Config;
pub use rules::RouteRules;
pub use telemetry::{LoggingConfig, TelemetryConfig};
pub use timeout::{KeepAliveConfig, TimeoutConfig};
