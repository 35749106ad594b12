//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, auth middleware, proxy handler)
//!     → request.rs (request ID, outbound request)
//!     → client.rs (send to backend, wait for the response head)
//!     → response.rs (status + content type)
//!     → relay.rs (stream the body, chunk by chunk)
//!     → Send to client
//! ```

pub mod client;
pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use client::BackendClient;
pub use relay::{RelayError, RelayStream};
pub use request::{build_outbound_request, RequestId, X_REQUEST_ID};
pub use response::relay_response;
pub use server::HttpServer;
