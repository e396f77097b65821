use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Request;
use std::net::{IpAddr, SocketAddr};
use tracing::debug;

use crate::admission::{AdmissionRequest, AuthContext};
use crate::config::AuthConfig;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Build the admission view of an inbound request
///
/// Identity comes from the configured principal/roles headers, the client address from the TCP
/// peer (or the first X-Forwarded-For hop when the peer is a trusted proxy).
pub fn admission_request<B>(
    req: &Request<B>,
    peer: SocketAddr,
    auth: &AuthConfig,
) -> AdmissionRequest {
    let mut admission = AdmissionRequest::new(req.method().clone(), req.uri().path())
        .with_client_addr(client_addr(req.headers(), peer, auth));

    if auth.trusts_identity_from(peer.ip()) {
        if let Some(ctx) = auth_context(req.headers(), auth) {
            admission = admission.with_auth(ctx);
        }
    }

    admission
}

/// Identity asserted by the authentication layer, if any
///
/// Empty or non-UTF-8 principal headers are ignored.
pub fn auth_context(headers: &HeaderMap, auth: &AuthConfig) -> Option<AuthContext> {
    let principal = header_str(headers, &auth.principal_header)?.trim();
    if principal.is_empty() {
        return None;
    }

    let authorities: Vec<&str> = header_str(headers, &auth.roles_header)
        .map(|roles| roles.split(',').map(str::trim).filter(|r| !r.is_empty()).collect())
        .unwrap_or_default();

    Some(AuthContext::authenticated(principal, authorities))
}

/// Address to key anonymous traffic on
pub fn client_addr(headers: &HeaderMap, peer: SocketAddr, auth: &AuthConfig) -> IpAddr {
    if !auth.is_trusted_proxy(peer.ip()) {
        return peer.ip();
    }

    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|hop| hop.trim().parse::<IpAddr>().ok());

    match forwarded {
        Some(ip) => ip,
        None => {
            debug!(%peer, "Trusted proxy sent no usable X-Forwarded-For, keying on peer");
            peer.ip()
        }
    }
}

/// Drop identity headers the gateway is not willing to vouch for
pub fn strip_untrusted_identity(headers: &mut HeaderMap, peer: SocketAddr, auth: &AuthConfig) {
    if auth.trusts_identity_from(peer.ip()) {
        return;
    }
    for name in [&auth.principal_header, &auth.roles_header] {
        if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
            headers.remove(name);
        }
    }
}

/// Append the peer to X-Forwarded-For and record the scheme
pub fn add_forwarded_headers(headers: &mut HeaderMap, peer: SocketAddr) {
    let client_ip = peer.ip().to_string();
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {client_ip}"),
        None => client_ip,
    };
    if let Ok(hv) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, hv);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
