//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (axum middleware)
//!     → auth.rs (resolve source address, check allowlist, check bearer)
//!     → 401 on failure, otherwise pass to the proxy handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or unreadable header never admits a request
//! - The client sees a bare 401; which check failed is only logged
//! - `X-Forwarded-For` is trusted as sent. It is client controlled, so an
//!   allowlist is only meaningful behind a proxy that overwrites it

pub mod access_control;
pub mod auth;

pub use access_control::auth_middleware;
pub use auth::{AuthDecision, AuthPolicy, RejectReason};
