use std::net::IpAddr;

use poem::Request;
use poem::http::header;
use poem_openapi::auth::Bearer;

use crate::providers::TokenProvider;
use crate::types::internal::auth::Claims;

use super::{request_id::RequestId, request_source::RequestSource};

/// Request context that flows from the endpoint into coordinators
///
/// Carries what the guard chain needs (validated claims) and what the audit
/// writer records (IP, user agent, request id, actor).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// IP address of the client making the request
    pub ip_address: Option<IpAddr>,

    pub user_agent: Option<String>,

    /// Unique identifier for this request (for tracing across layers)
    pub request_id: RequestId,

    /// Whether a bearer token was presented and validated
    pub authenticated: bool,

    /// Validated token claims
    pub claims: Option<Claims>,

    /// Source of the request (API, CLI, or System)
    pub source: RequestSource,

    /// User who initiated the operation; `None` for CLI and system work
    pub actor_id: Option<i32>,
}

impl RequestContext {
    /// Build the context for an HTTP request
    ///
    /// A token that fails validation leaves the context unauthenticated; the
    /// guard chain turns that into a 401 when the endpoint needs a principal.
    pub fn from_request(req: &Request, auth: Option<&Bearer>, token_provider: &TokenProvider) -> Self {
        let mut ctx = Self {
            ip_address: Self::extract_ip_address(req),
            user_agent: req
                .header(header::USER_AGENT)
                .map(|ua| ua.to_string()),
            request_id: RequestId::new(),
            authenticated: false,
            claims: None,
            source: RequestSource::API,
            actor_id: None,
        };

        if let Some(bearer) = auth {
            match token_provider.verify_token(&bearer.token) {
                Ok(claims) => ctx = ctx.with_auth(claims),
                Err(e) => tracing::debug!(request_id = %ctx.request_id, "Bearer token rejected: {}", e),
            }
        }

        tracing::trace!("Request context created: {:?}", ctx);
        ctx
    }

    /// Unauthenticated API context with no request metadata
    pub fn new() -> Self {
        Self::unattended(RequestSource::API)
    }

    /// Context for CLI commands; there is no authenticated actor
    pub fn for_cli() -> Self {
        Self::unattended(RequestSource::CLI)
    }

    fn unattended(source: RequestSource) -> Self {
        Self {
            ip_address: None,
            user_agent: None,
            request_id: RequestId::new(),
            authenticated: false,
            claims: None,
            source,
            actor_id: None,
        }
    }

    /// Checks X-Forwarded-For, X-Real-IP, then the socket peer address
    fn extract_ip_address(req: &Request) -> Option<IpAddr> {
        if let Some(forwarded) = req.header("X-Forwarded-For") {
            if let Some(ip) = forwarded.split(',').next() {
                return ip.trim().parse().ok();
            }
        }

        if let Some(real_ip) = req.header("X-Real-IP") {
            return real_ip.trim().parse().ok();
        }

        req.remote_addr().as_socket_addr().map(|addr| addr.ip())
    }

    pub fn with_ip_address(mut self, ip_address: IpAddr) -> Self {
        self.ip_address = Some(ip_address);
        self
    }

    /// Mark the context authenticated; the claims' user becomes the actor
    pub fn with_auth(mut self, claims: Claims) -> Self {
        self.authenticated = true;
        self.actor_id = Some(claims.user_id);
        self.claims = Some(claims);
        self
    }

    /// User id from the validated claims
    pub fn claimed_user_id(&self) -> Option<i32> {
        self.claims.as_ref().map(|claims| claims.user_id)
    }
}
