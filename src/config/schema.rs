//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default backend: a local inference server.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The single backend every accepted request is forwarded to.
    pub backend: BackendConfig,

    /// Bearer credential and address allowlist.
    pub auth: AuthConfig,

    /// Where the proxy is mounted on the inbound side.
    pub routing: RoutingConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL the inbound path is appended to.
    pub base_url: String,

    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Maximum wait for the backend's response headers, in seconds.
    pub response_timeout_secs: u64,

    /// Maximum gap between two body chunks from the backend, in seconds.
    pub idle_timeout_secs: u64,

    /// How long an unused pooled connection is kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Largest chunk handed to the client in one write.
    pub relay_chunk_size: usize,
}

impl BackendConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout_secs: 5,
            // Non-streaming generations only send headers once the whole
            // completion is ready.
            response_timeout_secs: 600,
            idle_timeout_secs: 300,
            pool_idle_timeout_secs: 90,
            relay_chunk_size: 1024,
        }
    }
}

/// Authentication settings.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret expected as `Authorization: Bearer <api_key>`.
    pub api_key: String,

    /// Permitted source addresses (exact match). Empty allows everyone.
    pub allowed_ips: Vec<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &"<redacted>")
            .field("allowed_ips", &self.allowed_ips)
            .finish()
    }
}

/// Inbound routing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path prefix the proxy is mounted under, stripped before forwarding.
    /// Empty mounts it at the root.
    pub mount_path: String,
}

/// Request size limits.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes. Unbounded when unset.
    pub max_body_bytes: Option<usize>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Bind address of the scrape endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
