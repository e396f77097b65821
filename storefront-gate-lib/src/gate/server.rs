use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::admission::AdmissionController;
use crate::config::{AuthConfig, Config};
use crate::error::{GateError, Result};
use crate::gate::forwarding::UpstreamClient;
use crate::gate::handler::handle_request;
use crate::telemetry::Metrics;

/// Everything a connection task needs to serve requests
pub struct GateState {
    pub controller: Arc<AdmissionController>,
    pub upstream: UpstreamClient,
    pub auth: AuthConfig,
    pub metrics: Option<Arc<Metrics>>,
    pub shutdown_timeout: Duration,
}

impl GateState {
    pub fn new(
        config: &Config,
        controller: Arc<AdmissionController>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            controller,
            upstream: UpstreamClient::new(&config.upstream, &config.timeout, metrics.clone()),
            auth: config.auth.clone(),
            metrics,
            shutdown_timeout: Duration::from_secs(config.timeout.shutdown_secs),
        }
    }
}

/// Bind the configured listen address and serve until SIGTERM/SIGINT
pub async fn run(config: Arc<Config>, state: Arc<GateState>) -> Result<()> {
    let addr = config.listen;
    let listener = TcpListener::bind(addr).await.map_err(GateError::Io)?;
    let shutdown = shutdown_signal()?;

    info!(?addr, upstream = %state.upstream.upstream(), "starting storefront gate (h1/h2)");
    serve(listener, state, shutdown).await
}

/// Accept connections on `listener` until `shutdown` resolves, then drain in-flight connections
pub async fn serve<F>(listener: TcpListener, state: Arc<GateState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let builder = ConnBuilder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                let builder = builder.clone();
                let watcher = graceful.watcher();
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle_request(req, peer, &state).await) }
                    });

                    let conn = builder.serve_connection(TokioIo::new(stream), svc);
                    if let Err(e) = watcher.watch(conn).await {
                        warn!(?peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }

    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => {
            info!("All connections closed gracefully");
        }
        _ = tokio::time::sleep(state.shutdown_timeout) => {
            warn!(
                timeout = ?state.shutdown_timeout,
                "Shutdown timeout reached, dropping remaining connections"
            );
        }
    }

    Ok(())
}

fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(|e| {
        GateError::Io(std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))
    })?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).map_err(|e| {
        GateError::Io(std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))
    })?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        }
    })
}
