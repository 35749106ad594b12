//! Request authentication.
//!
//! Every check here is a pure function of the request metadata and the
//! static policy. Nothing is cached between requests.

use std::fmt;
use std::net::IpAddr;

use axum::http::{header, HeaderMap};

use crate::config::AuthConfig;

/// Header carrying the caller address when the gateway sits behind another proxy.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Why a request was turned away. Logged, never sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    BadAddress,
    BadCredential,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::BadAddress => "bad_address",
            RejectReason::BadCredential => "bad_credential",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Accept { source: Option<String> },
    Reject {
        reason: RejectReason,
        source: Option<String>,
    },
}

/// Allowlist and expected bearer secret.
#[derive(Clone)]
pub struct AuthPolicy {
    allowlist: Vec<String>,
    api_key: String,
}

impl AuthPolicy {
    pub fn new(allowlist: Vec<String>, api_key: impl Into<String>) -> Self {
        Self {
            allowlist,
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.allowed_ips.clone(), config.api_key.clone())
    }

    pub fn is_open(&self) -> bool {
        self.allowlist.is_empty()
    }
}

impl fmt::Debug for AuthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPolicy")
            .field("allowlist", &self.allowlist)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Caller address: `X-Forwarded-For` verbatim when present, else the peer IP.
///
/// The forwarding header is client supplied and is not checked against the
/// transport peer. A forwarding header that is not visible ASCII resolves to
/// `None` rather than falling back to the peer.
pub fn resolve_source_address(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<String> {
    match headers.get(X_FORWARDED_FOR) {
        Some(value) => value.to_str().ok().map(str::to_owned),
        None => peer.map(|ip| ip.to_string()),
    }
}

/// Empty allowlist admits everyone; otherwise exact string membership.
pub fn is_address_allowed(address: &str, allowlist: &[String]) -> bool {
    allowlist.is_empty() || allowlist.iter().any(|allowed| allowed == address)
}

/// True only for the exact value `Bearer <expected_key>`.
pub fn is_credential_valid(authorization: Option<&str>, expected_key: &str) -> bool {
    match authorization.and_then(|value| value.strip_prefix("Bearer ")) {
        Some(token) => !expected_key.is_empty() && token == expected_key,
        None => false,
    }
}

/// Address check first, then credential. Stops at the first failure.
pub fn authenticate(headers: &HeaderMap, peer: Option<IpAddr>, policy: &AuthPolicy) -> AuthDecision {
    let source = resolve_source_address(headers, peer);

    let address_ok = match source.as_deref() {
        Some(address) => is_address_allowed(address, &policy.allowlist),
        None => policy.is_open(),
    };
    if !address_ok {
        return AuthDecision::Reject {
            reason: RejectReason::BadAddress,
            source,
        };
    }

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    if !is_credential_valid(authorization, &policy.api_key) {
        return AuthDecision::Reject {
            reason: RejectReason::BadCredential,
            source,
        };
    }

    AuthDecision::Accept { source }
}
