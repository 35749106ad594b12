//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router and mount the proxy
//! - Wire up middleware (tracing, body limit, authentication)
//! - Forward accepted requests to the backend and relay the response
//! - Serve until a shutdown signal arrives

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::Instrument;

use crate::config::GatewayConfig;
use crate::http::client::BackendClient;
use crate::http::request::{build_outbound_request, RequestId};
use crate::http::response::relay_response;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::security::{auth_middleware, AuthPolicy};

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
    pub relay_chunk_size: usize,
    pub idle_timeout: Option<Duration>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState {
            backend: BackendClient::new(&config.backend),
            relay_chunk_size: config.backend.relay_chunk_size,
            idle_timeout: Some(config.backend.idle_timeout()),
        };
        let policy = Arc::new(AuthPolicy::from_config(&config.auth));

        let router = Self::build_router(&config, state, policy);
        Self {
            router,
            config: Arc::new(config),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState, policy: Arc<AuthPolicy>) -> Router {
        let methods = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE);

        let proxy = Router::new()
            .route("/", on(methods, proxy_handler))
            .route("/{*path}", on(methods, proxy_handler))
            .route_layer(middleware::from_fn_with_state(policy, auth_middleware))
            .with_state(state);

        let mount = config.routing.mount_path.as_str();
        let router = if mount.is_empty() {
            proxy
        } else {
            Router::new().nest(mount, proxy)
        };

        let body_limit = config.limits.max_body_bytes.unwrap_or(usize::MAX);

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
    }

    /// The router without a listener, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Returns after a shutdown (Ctrl-C, SIGTERM or `shutdown`) once
    /// in-flight responses have drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.base_url,
            mount_path = %self.config.routing.mount_path,
            allowlist_entries = self.config.auth.allowed_ips.len(),
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Forward an authenticated request and stream the backend response back.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Response {
    let request_id = RequestId::from_headers(request.headers());
    let method = request.method().clone();
    let span = tracing::info_span!(
        "proxy",
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
    );

    async move {
        tracing::debug!(
            content_length = request
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown"),
            "Forwarding request"
        );

        let outbound = match build_outbound_request(request, state.backend.base_url()) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot build backend request");
                metrics::record_request(method.as_str(), e.status().as_u16());
                return e.into_response();
            }
        };

        match state.backend.dispatch(outbound).await {
            Ok(backend_response) => {
                let status = backend_response.status();
                tracing::info!(status = status.as_u16(), "Backend responded; relaying body");
                metrics::record_request(method.as_str(), status.as_u16());
                relay_response(backend_response, state.relay_chunk_size, state.idle_timeout)
            }
            Err(e) => {
                tracing::error!(error = %e, "Backend request failed");
                metrics::record_request(method.as_str(), e.status().as_u16());
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.api_key = "secret123".into();
        // Nothing listens here; tests below must not reach the backend.
        config.backend.base_url = "http://127.0.0.1:9".into();
        config.backend.connect_timeout_secs = 1;
        config
    }

    fn request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn rejects_missing_credential() {
        let server = HttpServer::new(config());
        let res = server
            .router()
            .oneshot(request("GET", "/models", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unsupported_method_is_405() {
        let server = HttpServer::new(config());
        let res = server
            .router()
            .oneshot(request("PATCH", "/models", Some("Bearer secret123")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn paths_outside_mount_are_404() {
        let mut config = config();
        config.routing.mount_path = "/api".into();
        let server = HttpServer::new(config);
        let res = server
            .router()
            .oneshot(request("GET", "/models", Some("Bearer secret123")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn declared_oversize_body_is_413() {
        let mut config = config();
        config.limits.max_body_bytes = Some(8);
        let server = HttpServer::new(config);
        let req = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .header("authorization", "Bearer secret123")
            .header("content-length", "32")
            .body(Body::from(vec![b'x'; 32]))
            .unwrap();
        let res = server.router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
