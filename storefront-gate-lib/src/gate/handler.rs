use http::StatusCode;
use hyper::body::Incoming;
use hyper::{Request, Response};
use std::net::SocketAddr;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::admission::AdmissionDecision;
use crate::gate::request::{add_forwarded_headers, admission_request, strip_untrusted_identity};
use crate::gate::response::{
    annotate_remaining, rejection_response, synthetic_error_response, RespBody,
};
use crate::gate::server::GateState;

/// Admit, reject or forward one request
///
/// Never fails: upstream errors become synthetic 4xx/5xx answers.
pub async fn handle_request(
    mut req: Request<Incoming>,
    peer: SocketAddr,
    state: &GateState,
) -> Response<RespBody> {
    let start = Instant::now();
    let method = req.method().to_string();
    let protocol = format!("{:?}", req.version());

    let admission = admission_request(&req, peer, &state.auth);
    let decision = state.controller.check(&admission);

    let resp = match decision {
        AdmissionDecision::Rejected { retry_after, .. } => rejection_response(retry_after),
        decision => {
            strip_untrusted_identity(req.headers_mut(), peer, &state.auth);
            add_forwarded_headers(req.headers_mut(), peer);

            match state.upstream.forward(req).await {
                Ok(mut resp) => {
                    if let AdmissionDecision::Allowed { remaining, .. } = decision {
                        annotate_remaining(&mut resp, remaining);
                    }
                    resp
                }
                Err(e) => {
                    error!(%peer, path = %admission.path, error = %e, "Upstream request failed");
                    synthetic_error_response(StatusCode::from(e))
                }
            }
        }
    };

    debug!(%peer, path = %admission.path, status = resp.status().as_u16(), "Request handled");
    if let Some(ref m) = state.metrics {
        m.record_request(&method, resp.status().as_u16(), &protocol, start.elapsed().as_secs_f64());
    }

    resp
}
