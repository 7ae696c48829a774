//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::live_reload::ReloadRegistry;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Directory files are served from.
    pub(crate) root: PathBuf,
    /// Open live reload connections.
    pub(crate) registry: Arc<ReloadRegistry>,
}
