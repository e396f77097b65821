use std::io::Write;

use storefront_gate_lib::config::{load_from_path, load_from_str, RouteRules};
use tempfile::NamedTempFile;

#[test]
fn loads_minimal_config() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut file = NamedTempFile::new()?;
    writeln!(
        file,
        r#"
listen = "127.0.0.1:0"
upstream = "localhost:9000"
"#
    )?;

    let cfg = load_from_path(file.path())?;
    assert_eq!(cfg.listen.to_string(), "127.0.0.1:0");
    assert_eq!(cfg.upstream, "localhost:9000");
    assert_eq!(cfg.rules, RouteRules::default());
    assert_eq!(cfg.auth.principal_header, "x-authenticated-user");
    assert_eq!(cfg.auth.roles_header, "x-authenticated-roles");
    assert!(cfg.auth.trusted_proxies.is_empty());
    assert!(!cfg.auth.trust_identity_from_any_peer);
    assert!(!cfg.auth.trusts_identity_from("127.0.0.1".parse()?));
    assert_eq!(cfg.logging.level, "info");
    assert!(!cfg.logging.show_target);
    assert_eq!(cfg.timeout.connect_ms, 5000);
    assert_eq!(cfg.timeout.upstream_secs, 30);
    assert_eq!(cfg.timeout.shutdown_secs, 30);
    assert!(cfg.timeout.keep_alive.enabled);
    assert_eq!(cfg.timeout.keep_alive.timeout_secs, 60);
    assert!(cfg.telemetry.metrics_port.is_none());
    assert!(cfg.telemetry.observability_addr().is_none());
    assert_eq!(cfg.telemetry.bind_addr.to_string(), "127.0.0.1");
    assert_eq!(cfg.telemetry.otel_log_level, "warn");
    Ok(())
}

#[test]
fn loads_full_config() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cfg = load_from_str(
        r#"
listen = "0.0.0.0:8080"
upstream = "storefront-api:9000"

[logging]
level = "debug"
show_target = true

[telemetry]
metrics_port = 9090
bind_addr = "10.1.0.4"
otel_log_level = "error"

[timeout]
connect_ms = 250
upstream_secs = 5
shutdown_secs = 2

[timeout.keep_alive]
enabled = false
timeout_secs = 15

[auth]
principal_header = "x-user"
roles_header = "x-roles"
trusted_proxies = ["10.0.0.0/8", "::1", "192.168.1.1"]

[rules]
exempt_prefixes = []
login_path = "/auth/login"
"#,
    )?;

    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.show_target);
    assert_eq!(cfg.telemetry.metrics_port, Some(9090));
    assert_eq!(
        cfg.telemetry.observability_addr().map(|a| a.to_string()),
        Some("10.1.0.4:9090".to_string())
    );
    assert_eq!(cfg.telemetry.otel_log_level, "error");
    assert_eq!(cfg.timeout.connect_ms, 250);
    assert!(!cfg.timeout.keep_alive.enabled);
    assert_eq!(cfg.auth.principal_header, "x-user");
    assert_eq!(cfg.auth.trusted_proxies.len(), 3);
    assert!(cfg.auth.is_trusted_proxy("10.20.30.40".parse()?));
    assert!(cfg.auth.is_trusted_proxy("::1".parse()?));
    assert!(cfg.auth.is_trusted_proxy("192.168.1.1".parse()?));
    assert!(!cfg.auth.is_trusted_proxy("192.168.1.2".parse()?));
    assert!(!cfg.auth.trusts_identity_from("172.16.0.1".parse()?));
    assert!(cfg.auth.trusts_identity_from("10.20.30.40".parse()?));

    assert!(cfg.rules.exempt_prefixes.is_empty());
    assert_eq!(cfg.rules.login_path, "/auth/login");
    // Untouched rules keep their defaults
    assert_eq!(cfg.rules.register_path, "/api/users/register");
    assert_eq!(cfg.rules.payments_prefix, "/api/payments");
    Ok(())
}

#[test]
fn sample_config_is_valid() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("config")
        .join("storefront-gate.toml");
    let cfg = load_from_path(path)?;
    assert_eq!(cfg.telemetry.metrics_port, Some(9090));
    assert_eq!(
        cfg.telemetry.observability_addr().map(|a| a.ip().is_loopback()),
        Some(true)
    );
    assert_eq!(cfg.rules.exempt_prefixes, vec!["/api/products".to_string()]);
    Ok(())
}

#[test]
fn identity_from_any_peer_is_opt_in() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cfg = load_from_str(
        r#"
listen = "127.0.0.1:0"
upstream = "localhost:9000"

[auth]
trust_identity_from_any_peer = true
"#,
    )?;
    assert!(cfg.auth.trusts_identity_from("203.0.113.7".parse()?));
    // X-Forwarded-For still needs an explicit proxy
    assert!(!cfg.auth.is_trusted_proxy("203.0.113.7".parse()?));
    Ok(())
}

#[test]
fn rejects_invalid_configs() {
    const BASE: &str = "listen = \"127.0.0.1:0\"\nupstream = \"localhost:9000\"\n";
    let cases = [
        ("missing upstream", "listen = \"127.0.0.1:0\"\n".to_string()),
        ("empty upstream", "listen = \"127.0.0.1:0\"\nupstream = \"  \"\n".to_string()),
        (
            "upstream without port",
            "listen = \"127.0.0.1:0\"\nupstream = \"localhost\"\n".to_string(),
        ),
        ("bad listen", "listen = \"nope\"\nupstream = \"localhost:9000\"\n".to_string()),
        (
            "metrics port collides",
            "listen = \"127.0.0.1:8080\"\nupstream = \"localhost:9000\"\n\
             [telemetry]\nmetrics_port = 8080\n"
                .to_string(),
        ),
        ("relative rule path", format!("{BASE}[rules]\nlogin_path = \"login\"\n")),
        ("bad header name", format!("{BASE}[auth]\nprincipal_header = \"x user\"\n")),
        ("bad trusted proxy", format!("{BASE}[auth]\ntrusted_proxies = [\"10.0.0.0/99\"]\n")),
        ("bad bind address", format!("{BASE}[telemetry]\nbind_addr = \"localhost\"\n")),
        ("zero connect timeout", format!("{BASE}[timeout]\nconnect_ms = 0\n")),
        ("zero upstream timeout", format!("{BASE}[timeout]\nupstream_secs = 0\n")),
    ];

    for (name, toml) in cases {
        assert!(load_from_str(&toml).is_err(), "{name} should be rejected");
    }
}

#[test]
fn missing_file_is_a_config_error() {
    match load_from_path("/definitely/not/here/storefront-gate.toml") {
        Err(storefront_gate_lib::GateError::Config(msg)) => {
            assert!(msg.contains("Failed to read config file"));
        }
        other => panic!("expected config error, got {other:?}"),
    }
}
