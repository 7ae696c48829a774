//! Static file server with live reload.
//!
//! Serves a directory over HTTP and keeps every open HTML page in sync with
//! it: pages get a small script that subscribes to the server-sent-event
//! endpoint at `/livereload`, and any change under the served directory
//! pushes a `reload` frame to every subscribed page.
//!
//! # Quick Start
//!
//! ```ignore
//! use relive_server::{LiveReloadServer, ServerConfig};
//!
//! let config = ServerConfig {
//!     root: "public".into(),
//!     ..ServerConfig::default()
//! };
//!
//! let handle = LiveReloadServer::new(config)?.start()?;
//! let addr = handle.listening().await?;
//! println!("http://{addr}");
//!
//! tokio::signal::ctrl_c().await?;
//! handle.shutdown().await;
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum router
//!                      │
//!                      ├─► /livereload ──► ReloadRegistry (one stream per tab)
//!                      │                        ▲
//!                      │                        │ broadcast
//!                      │                   Broadcaster (debounce)
//!                      │                        ▲
//!                      │                        │ ChangeEvent
//!                      │                   ChangeSource (notify / poll)
//!                      │
//!                      └─► static files ──► reload script injection (HTML only)
//! ```

mod app;
mod error;
pub mod inject;
mod live_reload;
pub mod mime;
mod server;
mod state;
mod static_files;

use std::path::PathBuf;
use std::time::Duration;

use relive_config::WatcherKind;
use relive_watch::WatcherMode;

pub use error::{BindError, ServerError};
pub use live_reload::{DEFAULT_DEBOUNCE, LIVERELOAD_PATH};
pub use server::{ListenerStatus, LiveReloadServer, ServerHandle};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on (0 picks a free port).
    pub port: u16,
    /// Directory to serve and watch.
    pub root: PathBuf,
    /// Minimum time between two reload broadcasts.
    pub debounce: Duration,
    /// Filesystem watcher backend.
    pub watcher: WatcherMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            root: PathBuf::from("."),
            debounce: DEFAULT_DEBOUNCE,
            watcher: WatcherMode::Native,
        }
    }
}

/// Create server configuration from relive config.
#[must_use]
pub fn server_config_from_relive_config(config: &relive_config::Config) -> ServerConfig {
    let live_reload = &config.live_reload;
    let watcher = match live_reload.watcher {
        WatcherKind::Native => WatcherMode::Native,
        WatcherKind::Poll => WatcherMode::Poll {
            interval: Duration::from_millis(live_reload.poll_interval_ms),
        },
    };

    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        root: config.root.clone(),
        debounce: Duration::from_millis(live_reload.debounce_ms),
        watcher,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert_eq!(config.watcher, WatcherMode::Native);
    }

    #[test]
    fn test_from_relive_config() {
        let mut config = relive_config::Config::default();
        config.server.host = "0.0.0.0".to_owned();
        config.server.port = 3000;
        config.root = PathBuf::from("/srv/site");
        config.live_reload.debounce_ms = 0;

        let server = server_config_from_relive_config(&config);

        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 3000);
        assert_eq!(server.root, PathBuf::from("/srv/site"));
        assert_eq!(server.debounce, Duration::ZERO);
        assert_eq!(server.watcher, WatcherMode::Native);
    }

    #[test]
    fn test_from_relive_config_poll_watcher() {
        let mut config = relive_config::Config::default();
        config.live_reload.watcher = WatcherKind::Poll;
        config.live_reload.poll_interval_ms = 250;

        let server = server_config_from_relive_config(&config);

        assert_eq!(
            server.watcher,
            WatcherMode::Poll {
                interval: Duration::from_millis(250)
            }
        );
    }
}
