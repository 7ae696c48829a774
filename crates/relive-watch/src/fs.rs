//! `notify`-backed change source.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::{CreateKind, MetadataKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::WatchError;
use crate::event::{ChangeEvent, ChangeKind, ChangeReceiver, WatchHandle};
use crate::ChangeSource;

/// How [`FsSource`] detects changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WatcherMode {
    /// Platform notifications (inotify, `FSEvents`, `ReadDirectoryChangesW`).
    #[default]
    Native,
    /// Rescan the tree at a fixed interval.
    Poll {
        /// Time between scans.
        interval: Duration,
    },
}

/// Change source watching a directory on the local filesystem.
#[derive(Clone, Debug, Default)]
pub struct FsSource {
    mode: WatcherMode,
}

impl FsSource {
    /// Create a source using the given watcher backend.
    #[must_use]
    pub fn new(mode: WatcherMode) -> Self {
        Self { mode }
    }
}

impl ChangeSource for FsSource {
    fn watch(&self, root: &Path) -> Result<(ChangeReceiver, WatchHandle), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let handler = move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                for change in classify(event) {
                    // Receiver gone means the server stopped listening
                    if tx.send(change).is_err() {
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "File watcher error"),
        };

        let mut watcher: Box<dyn Watcher + Send> = match self.mode {
            WatcherMode::Native => {
                Box::new(notify::recommended_watcher(handler).map_err(WatchError::Create)?)
            }
            WatcherMode::Poll { interval } => {
                let config = notify::Config::default().with_poll_interval(interval);
                Box::new(PollWatcher::new(handler, config).map_err(WatchError::Create)?)
            }
        };

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Watch {
                path: root.to_path_buf(),
                source,
            })?;

        tracing::debug!(root = %root.display(), mode = ?self.mode, "Watching for changes");

        Ok((ChangeReceiver::new(rx), WatchHandle::new(watcher)))
    }
}

/// Translate a raw `notify` event into change events.
///
/// Renames become a removal of the old path plus an addition of the new one.
/// Access events and metadata changes other than the write time are dropped.
fn classify(event: Event) -> Vec<ChangeEvent> {
    let Event { kind, paths, .. } = event;

    match kind {
        EventKind::Create(CreateKind::Folder) => tag_all(paths, ChangeKind::DirAdded),
        EventKind::Create(_) => paths
            .into_iter()
            .map(|path| {
                let kind = added_kind(&path);
                ChangeEvent { path, kind }
            })
            .collect(),
        EventKind::Remove(RemoveKind::Folder) => tag_all(paths, ChangeKind::DirRemoved),
        EventKind::Remove(_) => tag_all(paths, ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(mode)) => classify_rename(mode, paths),
        // Polling reports content edits as a write-time change
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)) => {
            tag_all(paths, ChangeKind::Changed)
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => tag_all(paths, ChangeKind::Changed),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn classify_rename(mode: RenameMode, paths: Vec<PathBuf>) -> Vec<ChangeEvent> {
    match mode {
        RenameMode::From => tag_all(paths, ChangeKind::Removed),
        RenameMode::To => paths
            .into_iter()
            .map(|path| {
                let kind = added_kind(&path);
                ChangeEvent { path, kind }
            })
            .collect(),
        RenameMode::Both => {
            let mut paths = paths.into_iter();
            let mut events = Vec::with_capacity(2);
            if let Some(from) = paths.next() {
                events.push(ChangeEvent::new(from, ChangeKind::Removed));
            }
            if let Some(to) = paths.next() {
                let kind = added_kind(&to);
                events.push(ChangeEvent::new(to, kind));
            }
            events
        }
        // Backends that can't pair renames only tell us a name changed
        RenameMode::Any | RenameMode::Other => paths
            .into_iter()
            .map(|path| {
                let kind = if path.exists() {
                    added_kind(&path)
                } else {
                    ChangeKind::Removed
                };
                ChangeEvent { path, kind }
            })
            .collect(),
    }
}

fn added_kind(path: &Path) -> ChangeKind {
    if path.is_dir() {
        ChangeKind::DirAdded
    } else {
        ChangeKind::Added
    }
}

fn tag_all(paths: Vec<PathBuf>, kind: ChangeKind) -> Vec<ChangeEvent> {
    paths
        .into_iter()
        .map(|path| ChangeEvent { path, kind })
        .collect()
}
