use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{GateError, Result};

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| GateError::Config(format!("Failed to read config file: {e}")))?;
    load_from_str(&txt)
}

pub fn load_from_str(txt: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(txt)
        .map_err(|e| GateError::Config(format!("Failed to parse config: {e}")))?;

    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> Result<()> {
    let upstream = cfg.upstream.trim();
    if upstream.is_empty() {
        return Err(GateError::Config("upstream address cannot be empty".into()));
    }
    let uri = format!("http://{upstream}/")
        .parse::<http::Uri>()
        .map_err(|e| GateError::Config(format!("Invalid upstream address '{upstream}': {e}")))?;
    if uri.port_u16().is_none() {
        return Err(GateError::Config(format!(
            "Upstream address must be host:port, got '{upstream}'"
        )));
    }

    if let Some(port) = cfg.telemetry.metrics_port {
        if port == cfg.listen.port() {
            return Err(GateError::Config(format!(
                "metrics_port {port} collides with the listen port"
            )));
        }
    }

    if let Some(bad) = cfg.rules.paths().find(|p| !p.starts_with('/')) {
        return Err(GateError::Config(format!("Rule path must start with '/': '{bad}'")));
    }

    for name in [&cfg.auth.principal_header, &cfg.auth.roles_header] {
        if http::HeaderName::from_bytes(name.as_bytes()).is_err() {
            return Err(GateError::Config(format!("Invalid header name: '{name}'")));
        }
    }

    if cfg.timeout.connect_ms == 0 {
        return Err(GateError::Config("connect_ms must be > 0".into()));
    }
    if cfg.timeout.upstream_secs == 0 {
        return Err(GateError::Config("upstream_secs must be > 0".into()));
    }

    Ok(())
}
