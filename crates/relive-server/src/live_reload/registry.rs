//! Registry of open reload connections.
//!
//! Every browser tab holds one server-sent-event stream. The registry owns
//! the sending half of each stream; the stream removes its entry when the
//! HTTP layer drops the response body (client went away).

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Payload of every reload frame.
pub(crate) const RELOAD_MESSAGE: &str = "reload";

/// Frames buffered per connection before further signals are dropped.
const CONNECTION_BUFFER: usize = 8;

/// Set of live reload connections, keyed by connection identity.
#[derive(Debug, Default)]
pub(crate) struct ReloadRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    connections: HashMap<Uuid, mpsc::Sender<&'static str>>,
    closed: bool,
}

impl ReloadRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a connection and return the stream feeding it.
    ///
    /// After [`close_all`](Self::close_all) the connection is not added and
    /// the returned stream ends immediately.
    pub(crate) fn register(self: &Arc<Self>) -> ReloadStream {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        let id = Uuid::new_v4();

        let mut inner = self.lock();
        if inner.closed {
            tracing::debug!(%id, "Reload connection refused, server closing");
        } else {
            inner.connections.insert(id, tx);
            tracing::debug!(%id, connections = inner.connections.len(), "Reload connection opened");
        }
        drop(inner);

        ReloadStream {
            id,
            rx,
            registry: Arc::clone(self),
        }
    }

    /// Remove a connection. Returns `false` if it was already gone.
    pub(crate) fn unregister(&self, id: Uuid) -> bool {
        let mut inner = self.lock();
        let removed = inner.connections.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, connections = inner.connections.len(), "Reload connection closed");
        }
        removed
    }

    /// Send one reload frame to every registered connection.
    ///
    /// Returns the number of connections that accepted the frame. A
    /// connection whose transport is gone is skipped; its guard removes it.
    pub(crate) fn broadcast(&self) -> usize {
        let inner = self.lock();
        let mut delivered = 0;

        for (id, tx) in &inner.connections {
            match tx.try_send(RELOAD_MESSAGE) {
                Ok(()) => delivered += 1,
                // A reload is already queued for this tab
                Err(TrySendError::Full(_)) => delivered += 1,
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%id, "Skipping closed reload connection");
                }
            }
        }

        delivered
    }

    /// Evict every connection and refuse new ones.
    ///
    /// Dropping the senders ends each stream, which completes its response.
    pub(crate) fn close_all(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        let count = inner.connections.len();
        inner.connections.clear();
        tracing::debug!(count, "Closed all reload connections");
    }

    /// Number of registered connections.
    pub(crate) fn len(&self) -> usize {
        self.lock().connections.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Stream of reload messages for one connection.
///
/// Dropping it removes the connection from the registry.
#[derive(Debug)]
pub(crate) struct ReloadStream {
    id: Uuid,
    rx: mpsc::Receiver<&'static str>,
    registry: Arc<ReloadRegistry>,
}

impl ReloadStream {
    /// Identity of this connection in the registry.
    #[cfg(test)]
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for ReloadStream {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}

impl Stream for ReloadStream {
    type Item = &'static str;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
