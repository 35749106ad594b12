//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Shutdown:
//!     Signal or Shutdown::trigger → Stop accepting → Drain responses → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, including a missing API key
//! - In-flight relays are allowed to finish during graceful shutdown

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
