//! Hand-driven change source for tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;

use crate::error::WatchError;
use crate::event::{ChangeEvent, ChangeKind, ChangeReceiver, WatchHandle};
use crate::ChangeSource;

type Sender = mpsc::UnboundedSender<ChangeEvent>;

/// Change source whose events are emitted explicitly with [`emit`](Self::emit).
///
/// Each call to [`ChangeSource::watch`] arms a new receiver. A receiver stops
/// getting events once its [`WatchHandle`] is dropped.
#[derive(Debug, Default)]
pub struct MockSource {
    armed: Mutex<Vec<(PathBuf, Weak<Sender>)>>,
}

impl MockSource {
    /// Create a source with no armed receivers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send an event to every armed receiver.
    ///
    /// Relative paths are joined onto the watched root, like a native
    /// watcher reporting absolute paths. Returns the number of receivers
    /// that got the event.
    pub fn emit(&self, path: impl AsRef<Path>, kind: ChangeKind) -> usize {
        let mut armed = self.armed.lock().unwrap_or_else(PoisonError::into_inner);
        armed.retain(|(_, tx)| tx.strong_count() > 0);

        armed
            .iter()
            .filter_map(|(root, tx)| tx.upgrade().map(|tx| (root, tx)))
            .filter(|(root, tx)| tx.send(ChangeEvent::new(root.join(&path), kind)).is_ok())
            .count()
    }

    /// Number of receivers whose handle is still alive.
    pub fn armed_count(&self) -> usize {
        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, tx)| tx.strong_count() > 0)
            .count()
    }
}

impl ChangeSource for MockSource {
    fn watch(&self, root: &Path) -> Result<(ChangeReceiver, WatchHandle), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let tx = Arc::new(tx);

        self.armed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((root.to_path_buf(), Arc::downgrade(&tx)));

        Ok((ChangeReceiver::new(rx), WatchHandle::new(tx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_emit_reaches_armed_receiver() {
        let source = MockSource::new();
        let (mut events, _handle) = source.watch(Path::new("/site")).unwrap();

        assert_eq!(source.emit("index.html", ChangeKind::Changed), 1);

        assert_eq!(
            events.try_recv(),
            Some(ChangeEvent::new("/site/index.html", ChangeKind::Changed))
        );
    }

    #[test]
    fn test_emit_without_receivers() {
        let source = MockSource::new();
        assert_eq!(source.emit("index.html", ChangeKind::Added), 0);
    }

    #[test]
    fn test_dropped_handle_disarms() {
        let source = MockSource::new();
        let (mut events, handle) = source.watch(Path::new("/site")).unwrap();
        assert_eq!(source.armed_count(), 1);

        handle.stop();

        assert_eq!(source.armed_count(), 0);
        assert_eq!(source.emit("index.html", ChangeKind::Changed), 0);
        assert!(events.try_recv().is_none());
    }

    #[test]
    fn test_absolute_path_kept() {
        let source = MockSource::new();
        let (mut events, _handle) = source.watch(Path::new("/site")).unwrap();

        source.emit("/elsewhere/file.txt", ChangeKind::Removed);

        assert_eq!(
            events.try_recv(),
            Some(ChangeEvent::new("/elsewhere/file.txt", ChangeKind::Removed))
        );
    }
}
