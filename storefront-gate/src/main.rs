#![forbid(unsafe_code)]

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_gate_lib::admission::AdmissionController;
use storefront_gate_lib::config::load_from_path;
use storefront_gate_lib::gate::{self, GateState};
use storefront_gate_lib::telemetry::{
    init_metrics, init_tracing, start_observability_server, ObservabilityState,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Storefront admission gate (per-identity rate limiting)")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "STOREFRONT_GATE_CONFIG",
        default_value = "config/storefront-gate.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            // Tracing is configured from the file, so it is not available yet
            eprintln!("failed to load configuration from {}: {err}", cli.config.display());
            std::process::exit(1);
        }
    };

    if let Err(err) = init_tracing(
        &cfg.logging.level,
        cfg.logging.show_target,
        &cfg.telemetry.otel_log_level,
    ) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    info!(?cfg.listen, upstream = %cfg.upstream, "configuration loaded");

    let (metrics, registry) = match init_metrics() {
        Ok((metrics, registry)) => (Some(metrics), Some(registry)),
        Err(err) => {
            warn!(%err, "failed to initialize metrics, continuing without them");
            (None, None)
        }
    };

    let mut controller = AdmissionController::new(cfg.rules.clone());
    if let Some(ref m) = metrics {
        controller = controller.with_metrics(Arc::clone(m));
    }
    let controller = Arc::new(controller);

    if let (Some(addr), Some(registry)) = (cfg.telemetry.observability_addr(), registry) {
        let state = Arc::new(ObservabilityState {
            registry,
            controller: Arc::clone(&controller),
            upstream: cfg.upstream.clone(),
        });
        tokio::spawn(async move {
            if let Err(err) = start_observability_server(addr, state).await {
                error!(%err, "observability server exited with error");
            }
        });
    }

    let cfg = Arc::new(cfg);
    let state = Arc::new(GateState::new(&cfg, controller, metrics));
    if let Err(err) = gate::run(cfg, state).await {
        error!(%err, "gate exited with error");
        std::process::exit(1);
    }
}
