//! Backend-to-client body relay.
//!
//! [`RelayStream`] is pulled by the client connection: a chunk is requested
//! from the backend only after the previous one was handed to hyper, so a
//! slow client stalls the backend read instead of filling a queue. At most
//! one backend frame is held, re-sliced into chunks of `chunk_size` bytes.
//!
//! Errors surface as a stream error. hyper then aborts the response without
//! the terminating chunk, which is how the client learns the body is
//! incomplete.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::{body::Bytes, BoxError};
use futures_util::Stream;
use thiserror::Error;
use tokio::time::{Instant, Sleep};
use tracing::Span;

use crate::observability::metrics;

/// A failure after the response head was already sent.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("backend stream failed: {0}")]
    Upstream(#[source] BoxError),

    #[error("backend sent nothing for {0:?}")]
    IdleTimeout(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelayState {
    Streaming,
    Complete,
    Failed,
}

struct IdleTimer {
    limit: Duration,
    sleep: Pin<Box<Sleep>>,
    armed: bool,
}

/// Stream of client-bound chunks read lazily from a backend body.
pub struct RelayStream<S> {
    upstream: S,
    pending: Bytes,
    chunk_size: usize,
    idle: Option<IdleTimer>,
    relayed: u64,
    state: RelayState,
    span: Span,
}

impl<S> RelayStream<S> {
    /// `idle_timeout` bounds the wait for each backend chunk. Creating a
    /// stream with a timeout requires a Tokio runtime.
    pub fn new(upstream: S, chunk_size: usize, idle_timeout: Option<Duration>) -> Self {
        let idle = idle_timeout.map(|limit| IdleTimer {
            limit,
            sleep: Box::pin(tokio::time::sleep(limit)),
            armed: false,
        });

        Self {
            upstream,
            pending: Bytes::new(),
            chunk_size: chunk_size.max(1),
            idle,
            relayed: 0,
            state: RelayState::Streaming,
            span: Span::current(),
        }
    }

    /// Bytes handed to the client so far.
    pub fn relayed(&self) -> u64 {
        self.relayed
    }

    fn fail(&mut self, error: RelayError) -> Poll<Option<Result<Bytes, RelayError>>> {
        self.state = RelayState::Failed;
        self.span.in_scope(|| {
            tracing::warn!(
                relayed_bytes = self.relayed,
                error = %error,
                "Backend stream interrupted; truncating response"
            );
        });
        metrics::record_stream_interrupted("backend");
        Poll::Ready(Some(Err(error)))
    }
}

impl<S, E> Stream for RelayStream<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<BoxError>,
{
    type Item = Result<Bytes, RelayError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.state != RelayState::Streaming {
            return Poll::Ready(None);
        }

        loop {
            if !this.pending.is_empty() {
                let n = this.chunk_size.min(this.pending.len());
                let chunk = this.pending.split_to(n);
                this.relayed += n as u64;
                return Poll::Ready(Some(Ok(chunk)));
            }

            // The idle window starts when we begin waiting on the backend,
            // not when the client last took a chunk.
            if let Some(idle) = this.idle.as_mut() {
                if !idle.armed {
                    idle.sleep.as_mut().reset(Instant::now() + idle.limit);
                    idle.armed = true;
                }
            }

            match Pin::new(&mut this.upstream).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    if let Some(idle) = this.idle.as_mut() {
                        idle.armed = false;
                    }
                    this.pending = bytes;
                }
                Poll::Ready(Some(Err(e))) => {
                    return this.fail(RelayError::Upstream(e.into()));
                }
                Poll::Ready(None) => {
                    this.state = RelayState::Complete;
                    this.span.in_scope(|| {
                        tracing::debug!(relayed_bytes = this.relayed, "Relay complete");
                    });
                    metrics::record_relayed_bytes(this.relayed);
                    return Poll::Ready(None);
                }
                Poll::Pending => {
                    if let Some(idle) = this.idle.as_mut() {
                        if idle.sleep.as_mut().poll(cx).is_ready() {
                            let limit = idle.limit;
                            return this.fail(RelayError::IdleTimeout(limit));
                        }
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}

impl<S> Drop for RelayStream<S> {
    fn drop(&mut self) {
        if self.state == RelayState::Streaming {
            self.span.in_scope(|| {
                tracing::info!(
                    relayed_bytes = self.relayed,
                    "Client went away before the relay finished; releasing backend connection"
                );
            });
            metrics::record_stream_interrupted("client");
        }
    }
}
