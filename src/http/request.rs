//! Inbound request handling.
//!
//! # Responsibilities
//! - Pick a request ID for log correlation
//! - Rewrite an accepted request into the one sent to the backend
//!
//! # Design Decisions
//! - The forwarded request differs from the inbound one only in its
//!   authority and the dropped `Host` header
//! - The body is moved, never buffered
//! - The request ID lives in the tracing span only; it is not injected
//!   into forwarded headers

use std::fmt;

use axum::http::{header, HeaderMap, Request, Uri, Version};
use uuid::Uuid;

use crate::error::GatewayError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Identifier attached to every log line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Reuse the caller's `x-request-id` if it is printable, else mint a UUID v4.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Join the backend base URL and the inbound path-and-query.
pub fn backend_uri(base_url: &str, inbound: &Uri) -> Result<Uri, GatewayError> {
    let suffix = inbound
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = format!("{}{}", base_url.trim_end_matches('/'), suffix);
    target
        .parse::<Uri>()
        .map_err(|e| GatewayError::BadRequest(format!("cannot forward to {target:?}: {e}")))
}

/// Build the request sent to the backend from an accepted inbound request.
///
/// Method, headers (every value, minus `Host`) and body carry over unchanged;
/// cookies travel inside the `Cookie` header. The outbound leg always speaks
/// HTTP/1.1 regardless of the inbound version.
pub fn build_outbound_request<B>(
    inbound: Request<B>,
    backend_base_url: &str,
) -> Result<Request<B>, GatewayError> {
    let (parts, body) = inbound.into_parts();
    let uri = backend_uri(backend_base_url, &parts.uri)?;

    let mut headers = parts.headers;
    headers.remove(header::HOST);

    let mut outbound = Request::new(body);
    *outbound.method_mut() = parts.method;
    *outbound.uri_mut() = uri;
    *outbound.version_mut() = Version::HTTP_11;
    *outbound.headers_mut() = headers;

    Ok(outbound)
}
