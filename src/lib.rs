//! Authenticated streaming gateway for a local inference server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ security::access_control ──▶ http::server (proxy handler)
//!                 (allowlist + bearer)            │
//!                        │ 401                    ├─ http::request  build outbound request
//!                        ▼                        ├─ http::client   dispatch, wait for head
//!                     Client                      └─ http::response + http::relay
//!                                                        stream body back ──▶ Client
//! ```
//!
//! Cross-cutting: `config` (immutable, loaded once), `observability`
//! (tracing + Prometheus), `lifecycle` (signals, graceful shutdown),
//! `error` (pre-header failure taxonomy).

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
