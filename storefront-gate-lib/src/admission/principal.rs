use std::net::IpAddr;

use crate::error::{GateError, Result};

/// Principal name carried by unauthenticated (anonymous) authentication contexts.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymousUser";

/// Authority granted to administrators.
pub const ADMIN_AUTHORITY: &str = "ROLE_ADMIN";

/// Identity attached to a request by the authentication layer in front of the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub principal: String,
    pub authenticated: bool,
    pub authorities: Vec<String>,
}

impl AuthContext {
    /// An authenticated principal holding `authorities`.
    pub fn authenticated<I, S>(principal: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principal: principal.into(),
            authenticated: true,
            authorities: authorities.into_iter().map(Into::into).collect(),
        }
    }

    /// The anonymous context some authentication layers attach to every unauthenticated request.
    pub fn anonymous() -> Self {
        Self {
            principal: ANONYMOUS_PRINCIPAL.to_string(),
            authenticated: true,
            authorities: vec!["ROLE_ANONYMOUS".to_string()],
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.principal == ANONYMOUS_PRINCIPAL
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }
}

/// Derives the identity used to partition bucket state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipalKeyResolver;

impl PrincipalKeyResolver {
    pub fn new() -> Self {
        Self
    }

    /// Principal name for authenticated, non-anonymous callers; client address otherwise.
    ///
    /// Fails only when there is neither a usable principal nor a client address.
    pub fn resolve(
        &self,
        auth: Option<&AuthContext>,
        client_addr: Option<IpAddr>,
    ) -> Result<String> {
        if let Some(principal) = auth.and_then(usable_principal) {
            return Ok(principal.to_string());
        }

        client_addr
            .map(|ip| ip.to_string())
            .ok_or_else(|| {
                GateError::Config("no client address available for rate limiting".into())
            })
    }
}

fn usable_principal(auth: &AuthContext) -> Option<&str> {
    if !auth.authenticated || auth.is_anonymous() {
        return None;
    }
    let principal = auth.principal.trim();
    (!principal.is_empty()).then_some(principal)
}
