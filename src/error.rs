//! Failures that happen before any response bytes reach the client.
//!
//! Once the backend's status line has been relayed the status can no longer
//! change; those failures live in [`crate::http::relay::RelayError`] and end
//! the stream instead.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::security::auth::RejectReason;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Address or credential check failed.
    #[error("unauthorized ({0})")]
    Unauthorized(RejectReason),

    /// The outbound request could not be built from the inbound one.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Connection refused, DNS failure, or the connection broke before headers.
    #[error("backend unreachable: {0}")]
    BackendUnreachable(#[source] hyper_util::client::legacy::Error),

    /// No response headers within the configured window.
    #[error("backend sent no response within {0:?}")]
    BackendTimeout(Duration),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::BackendUnreachable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Details stay in the logs.
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}
