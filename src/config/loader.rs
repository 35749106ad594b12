//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the bearer secret.
pub const ENV_API_KEY: &str = "API_KEY";
/// Comma separated allowlist.
pub const ENV_ALLOWED_IPS: &str = "GATEWAY_ALLOWED_IPS";
pub const ENV_BACKEND_URL: &str = "GATEWAY_BACKEND_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub backend_url: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut GatewayConfig) {
        if let Some(addr) = &self.bind_address {
            config.listener.bind_address = addr.clone();
        }
        if let Some(url) = &self.backend_url {
            config.backend.base_url = url.clone();
        }
    }
}

/// Load, merge and validate the configuration.
///
/// Precedence, lowest first: built-in defaults, the TOML file (if any), the
/// process environment, `overrides`.
pub fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_config(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok());
    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Merge environment variables into `config`. Empty values are ignored.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(key) = var(ENV_API_KEY) {
        config.auth.api_key = key;
    }

    if let Some(list) = var(ENV_ALLOWED_IPS) {
        config.auth.allowed_ips = list
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(String::from)
            .collect();
    }

    if let Some(url) = var(ENV_BACKEND_URL) {
        config.backend.base_url = url;
    }
}
