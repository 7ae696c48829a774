//! Filesystem change sources for the relive development server.
//!
//! A [`ChangeSource`] watches a directory tree and pushes [`ChangeEvent`]s
//! into a [`ChangeReceiver`]. The server never talks to a native watcher
//! directly, so any source can stand in:
//!
//! - [`FsSource`] with [`WatcherMode::Native`]: platform notifications via `notify`
//! - [`FsSource`] with [`WatcherMode::Poll`]: periodic scanning, for network
//!   mounts and containers without native notification support
//! - `MockSource` (`mock` feature): events emitted by hand, for tests
//!
//! Only changes that happen after [`ChangeSource::watch`] returns are
//! reported. Files already present in the tree are never announced.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use relive_watch::{ChangeSource, FsSource, WatcherMode};
//!
//! let source = FsSource::new(WatcherMode::Native);
//! let (mut events, handle) = source.watch(Path::new("public"))?;
//! while let Some(event) = events.recv().await {
//!     println!("{:?} {}", event.kind, event.path.display());
//! }
//! handle.stop();
//! ```

mod error;
mod event;
mod fs;
#[cfg(feature = "mock")]
mod mock;

use std::path::Path;

pub use error::WatchError;
pub use event::{ChangeEvent, ChangeKind, ChangeReceiver, WatchHandle};
pub use fs::{FsSource, WatcherMode};
#[cfg(feature = "mock")]
pub use mock::MockSource;

/// Push-based producer of filesystem change events.
pub trait ChangeSource: Send + Sync {
    /// Start watching `root` recursively.
    ///
    /// Returns a receiver for events and a handle that stops watching when
    /// dropped or stopped.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError`] if the underlying watcher cannot be created or
    /// cannot watch `root`.
    fn watch(&self, root: &Path) -> Result<(ChangeReceiver, WatchHandle), WatchError>;
}
