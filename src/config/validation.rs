//! Configuration validation.
//!
//! Serde handles the syntax; this module checks the values. All problems are
//! reported at once rather than stopping at the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("API key is not set (set API_KEY or auth.api_key)")]
    MissingApiKey,

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("invalid backend URL {url:?}: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("invalid mount path {0:?}: must start with '/' and not end with '/'")]
    InvalidMountPath(String),

    #[error("allowlist entry {0} is empty")]
    EmptyAllowlistEntry(usize),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.api_key.is_empty() {
        errors.push(ValidationError::MissingApiKey);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Err(reason) = check_backend_url(&config.backend.base_url) {
        errors.push(ValidationError::InvalidBackendUrl {
            url: config.backend.base_url.clone(),
            reason,
        });
    }

    let backend = &config.backend;
    for (name, value) in [
        ("backend.connect_timeout_secs", backend.connect_timeout_secs),
        ("backend.response_timeout_secs", backend.response_timeout_secs),
        ("backend.idle_timeout_secs", backend.idle_timeout_secs),
        ("backend.relay_chunk_size", backend.relay_chunk_size as u64),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(name));
        }
    }

    if config.limits.max_body_bytes == Some(0) {
        errors.push(ValidationError::ZeroValue("limits.max_body_bytes"));
    }

    let mount = &config.routing.mount_path;
    if !mount.is_empty() && !is_valid_mount_path(mount) {
        errors.push(ValidationError::InvalidMountPath(mount.clone()));
    }

    for (i, entry) in config.auth.allowed_ips.iter().enumerate() {
        if entry.trim().is_empty() {
            errors.push(ValidationError::EmptyAllowlistEntry(i));
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The pooled client speaks plain HTTP only; TLS is terminated elsewhere.
fn check_backend_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

fn is_valid_mount_path(path: &str) -> bool {
    path.len() > 1
        && path.starts_with('/')
        && !path.ends_with('/')
        && !path.contains(&['{', '}', '*', '?', '#'][..])
}
