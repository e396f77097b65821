use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::Registry;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::admission::AdmissionController;
use crate::gate::response::{full_body, RespBody};
use crate::telemetry::admin::{
    bad_request, clear_all_response, clear_key_response, method_not_allowed, MAX_ADMIN_BODY_BYTES,
};
use crate::telemetry::{
    handle_metrics, health_check_response, live_check_response, ready_check_response,
};

pub const CLEAR_KEY_PATH: &str = "/admin/rate-limit/clear";
pub const CLEAR_ALL_PATH: &str = "/admin/rate-limit/clear-all";

/// Shared state of the observability server
pub struct ObservabilityState {
    pub registry: Registry,
    pub controller: Arc<AdmissionController>,
    pub upstream: String,
}

/// Start the observability server that handles metrics, health checks and rate-limit resets
/// on `addr` (`[telemetry].bind_addr`, loopback unless configured otherwise).
/// This server runs on a dedicated port and serves:
/// - `/metrics` - Prometheus metrics
/// - `/health` - Health check endpoint
/// - `/ready` - Readiness check endpoint
/// - `/live` - Liveness check endpoint
/// - `POST /admin/rate-limit/clear` - Drop every bucket of one key
/// - `POST /admin/rate-limit/clear-all` - Drop every bucket
pub async fn start_observability_server(
    addr: SocketAddr,
    state: Arc<ObservabilityState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|e| std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
        .map_err(|e| std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))?;

    info!(?addr, "Observability server started (metrics + health checks + admin)");

    serve_observability(listener, state, async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Observability server: Received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("Observability server: Received SIGINT, shutting down"),
        }
    })
    .await;

    info!("Observability server stopped");
    Ok(())
}

/// Serve observability requests on `listener` until `shutdown` resolves
pub async fn serve_observability<F>(
    listener: TcpListener,
    state: Arc<ObservabilityState>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let builder = ConnBuilder::new(TokioExecutor::new());
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "Observability server: accept error");
                        continue;
                    }
                };

                let builder = builder.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let state = state.clone();
                        async move { Ok::<_, Infallible>(route(req, &state).await) }
                    });

                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "Observability server: serve_connection error");
                    }
                });
            }
        }
    }
}

async fn route(req: Request<Incoming>, state: &ObservabilityState) -> Response<RespBody> {
    let path = req.uri().path().to_string();
    let is_post = req.method() == Method::POST;

    let result = match path.as_str() {
        "/health" => health_check_response(),
        "/ready" => ready_check_response(&state.upstream),
        "/live" => live_check_response(),
        "/metrics" => handle_metrics(&state.registry),
        CLEAR_KEY_PATH if !is_post => method_not_allowed(),
        CLEAR_KEY_PATH => match read_body(req).await {
            Ok(body) => clear_key_response(&body, &state.controller),
            Err(e) => bad_request(&e),
        },
        CLEAR_ALL_PATH if !is_post => method_not_allowed(),
        CLEAR_ALL_PATH => clear_all_response(&state.controller),
        _ => Ok(plain_response(StatusCode::NOT_FOUND, "Not Found")),
    };

    result.unwrap_or_else(|e| {
        warn!(path = %path, error = %e, "Observability server: failed to build response");
        plain_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    })
}

async fn read_body(req: Request<Incoming>) -> Result<Bytes, String> {
    Limited::new(req.into_body(), MAX_ADMIN_BODY_BYTES)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

fn plain_response(status: StatusCode, text: &'static str) -> Response<RespBody> {
    let mut resp = Response::new(full_body(text));
    *resp.status_mut() = status;
    resp
}
