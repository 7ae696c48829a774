//! Change event types.

use std::path::PathBuf;

use tokio::sync::mpsc;

/// Kind of filesystem change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File contents changed.
    Changed,
    /// File was created or moved into the tree.
    Added,
    /// File was deleted or moved out of the tree.
    Removed,
    /// Directory was created or moved into the tree.
    DirAdded,
    /// Directory was deleted or moved out of the tree.
    DirRemoved,
}

/// A single filesystem change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path reported by the watcher (absolute for native and polling sources).
    pub path: PathBuf,
    /// Kind of change.
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Create a new change event.
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Receiving half of a change source.
///
/// Yields events in the order the source produced them. Returns `None` once
/// the source has stopped.
#[derive(Debug)]
pub struct ChangeReceiver {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeReceiver {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

/// Handle that keeps a change source alive.
///
/// Uses RAII: dropping the handle stops watching.
pub struct WatchHandle {
    guard: Option<Box<dyn Send>>,
}

impl WatchHandle {
    /// Wrap whatever keeps the source running (a watcher, a sender).
    pub(crate) fn new(guard: impl Send + 'static) -> Self {
        let guard: Box<dyn Send> = Box::new(guard);
        Self {
            guard: Some(guard),
        }
    }

    /// Stop watching immediately (consumes the handle).
    pub fn stop(mut self) {
        self.guard.take();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("active", &self.guard.is_some())
            .finish()
    }
}
