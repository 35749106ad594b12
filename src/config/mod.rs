//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse, merge environment and CLI overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc with the request path
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing is looked up globally while
//!   serving requests
//! - All fields have defaults to allow minimal configs
//! - A missing API key refuses startup instead of running unauthenticated

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::{
    AuthConfig, BackendConfig, GatewayConfig, LimitsConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, RoutingConfig,
};
