use http::{Request, Response};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::config::TimeoutConfig;
use crate::gate::http_result::{HttpError, HttpResult};
use crate::gate::response::RespBody;
use crate::telemetry::Metrics;

pub type HttpClient = Client<HttpConnector, Incoming>;

/// Pooled HTTP/1.1 client bound to the single business-logic upstream
#[derive(Clone)]
pub struct UpstreamClient {
    client: HttpClient,
    upstream: String,
    request_timeout: Duration,
    metrics: Option<Arc<Metrics>>,
}

impl UpstreamClient {
    pub fn new(upstream: &str, timeouts: &TimeoutConfig, metrics: Option<Arc<Metrics>>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_millis(timeouts.connect_ms)));
        // TCP keep-alive: sends periodic packets to keep TCP connection alive
        if timeouts.keep_alive.enabled {
            connector.set_keepalive(Some(Duration::from_secs(timeouts.keep_alive.timeout_secs)));
        } else {
            connector.set_keepalive(None);
        }

        let mut builder = Client::builder(TokioExecutor::new());
        builder.pool_idle_timeout(Duration::from_secs(timeouts.keep_alive.timeout_secs));

        Self {
            client: builder.build(connector),
            upstream: upstream.trim().to_string(),
            request_timeout: Duration::from_secs(timeouts.upstream_secs),
            metrics,
        }
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Send `req` to the upstream, keeping method, path, query, headers and body
    pub async fn forward(&self, req: Request<Incoming>) -> HttpResult<Response<RespBody>> {
        let start = Instant::now();

        let pq = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri = format!("http://{}{}", self.upstream, pq)
            .parse::<http::Uri>()
            .map_err(|e| HttpError::InvalidUri(e.to_string()))?;

        let (mut parts, body) = req.into_parts();
        parts.uri = uri;
        // Upstream connections are always HTTP/1.1, whatever the client spoke
        parts.version = http::Version::HTTP_11;
        let out_req = Request::from_parts(parts, body);

        debug!(upstream = %self.upstream, uri = %out_req.uri(), "Forwarding request");
        let result = tokio::time::timeout(self.request_timeout, self.client.request(out_req)).await;
        let duration = start.elapsed().as_secs_f64();

        let error = match result {
            Ok(Ok(resp)) => {
                if let Some(ref m) = self.metrics {
                    m.record_upstream_request(&self.upstream, resp.status().as_u16(), duration);
                }
                return Ok(resp.map(|b| b.boxed()));
            }
            Ok(Err(e)) => HttpError::FailedToGetResponseFromUpstream(e.to_string()),
            Err(_) => HttpError::UpstreamTimeout(self.request_timeout),
        };

        if let Some(ref m) = self.metrics {
            m.record_upstream_error(&self.upstream, error.error_type());
        }
        Err(error)
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("upstream", &self.upstream)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
