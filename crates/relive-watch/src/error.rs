//! Watcher error type.

use std::path::PathBuf;

/// Error starting a change source.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The native or polling watcher could not be created.
    #[error("failed to create file watcher: {0}")]
    Create(#[source] notify::Error),
    /// The watcher was created but refused the directory.
    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        /// Directory that could not be watched.
        path: PathBuf,
        /// Underlying watcher error.
        #[source]
        source: notify::Error,
    },
}
