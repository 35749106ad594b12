//! Access control middleware.
//! Admits a request only if its source address and bearer credential pass.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::security::auth::{authenticate, AuthDecision, AuthPolicy};

/// Runs before the proxy handler; rejected requests never reach the backend.
pub async fn auth_middleware(
    State(policy): State<Arc<AuthPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match authenticate(request.headers(), peer, &policy) {
        AuthDecision::Accept { source } => {
            tracing::info!(
                source = source.as_deref().unwrap_or("unknown"),
                method = %request.method(),
                path = %request.uri().path(),
                "Request admitted"
            );
            next.run(request).await
        }
        AuthDecision::Reject { reason, source } => {
            tracing::warn!(
                source = source.as_deref().unwrap_or("unknown"),
                reason = %reason,
                "Request rejected"
            );
            metrics::record_auth_rejection(reason.as_str());
            metrics::record_request(request.method().as_str(), 401);
            GatewayError::Unauthorized(reason).into_response()
        }
    }
}
