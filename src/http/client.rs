//! Backend leg: a pooled HTTP/1.1 client with bounded waits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{Request, Response},
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};

use crate::config::BackendConfig;
use crate::error::GatewayError;
use crate::observability::metrics;

/// Sends accepted requests to the backend, exactly once each.
#[derive(Clone)]
pub struct BackendClient {
    client: Client<HttpConnector, Body>,
    base_url: Arc<str>,
    response_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout()));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(config.pool_idle_timeout())
            .build(connector);

        Self {
            client,
            base_url: Arc::from(config.base_url.as_str()),
            response_timeout: config.response_timeout(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `request` and return once the response head has arrived.
    ///
    /// The body is left unread. Failures here have not produced any client
    /// bytes yet, so they map to a status code.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response<Incoming>, GatewayError> {
        let started = Instant::now();

        let result = tokio::time::timeout(self.response_timeout, self.client.request(request)).await;
        metrics::record_upstream_header_latency(started);

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(GatewayError::BackendUnreachable(e)),
            Err(_) => Err(GatewayError::BackendTimeout(self.response_timeout)),
        }
    }
}
