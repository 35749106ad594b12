//! Programmatic shutdown for the gateway.
//!
//! Signals cover the process case; this handle lets an embedding program (or
//! a test) stop a running [`crate::HttpServer`] without one.

use tokio::sync::broadcast;

/// Cloneable trigger for graceful shutdown.
///
/// Dropping every `Shutdown` handle also stops subscribed servers, since
/// their receivers observe the closed channel.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to hand to [`crate::HttpServer::run`].
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed server to stop accepting and drain.
    pub fn trigger(&self) {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::debug!(servers = notified, "Shutdown triggered");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
