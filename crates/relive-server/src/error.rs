//! Server error types.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use relive_watch::WatchError;

/// Errors raised while constructing or starting a server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Served directory does not exist.
    #[error("Directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Served path exists but is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Served path could not be inspected.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Change watcher could not be armed.
    #[error(transparent)]
    Watch(#[from] WatchError),
}

/// Listener could not be bound.
///
/// Cloneable so every caller of `ServerHandle::listening` sees it.
#[derive(Clone, Debug, thiserror::Error)]
#[error("Failed to listen on {addr}: {source}")]
pub struct BindError {
    /// Address the server tried to bind, as `host:port`.
    pub addr: String,
    #[source]
    source: Arc<io::Error>,
}

impl BindError {
    pub(crate) fn new(addr: String, source: io::Error) -> Self {
        Self {
            addr,
            source: Arc::new(source),
        }
    }

    /// Kind of the underlying I/O error.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }

    /// Whether another process already holds the port.
    #[must_use]
    pub fn is_addr_in_use(&self) -> bool {
        self.kind() == io::ErrorKind::AddrInUse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_names_path() {
        let err = ServerError::RootNotFound(PathBuf::from("/no/such/dir"));
        assert_eq!(err.to_string(), "Directory not found: /no/such/dir");
    }

    #[test]
    fn test_bind_error_kind() {
        let err = BindError::new(
            "127.0.0.1:8080".to_owned(),
            io::Error::from(io::ErrorKind::AddrInUse),
        );

        assert!(err.is_addr_in_use());
        assert!(err.to_string().starts_with("Failed to listen on 127.0.0.1:8080"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
