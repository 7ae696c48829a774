//! Server lifecycle.
//!
//! [`LiveReloadServer`] validates configuration; [`LiveReloadServer::start`]
//! arms the change source and spawns the listener, returning a
//! [`ServerHandle`] that owns everything running until
//! [`ServerHandle::shutdown`].

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use relive_watch::{ChangeEvent, ChangeReceiver, ChangeSource, FsSource, WatchHandle};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;

use crate::ServerConfig;
use crate::app;
use crate::error::{BindError, ServerError};
use crate::live_reload::{Broadcaster, ReloadRegistry};
use crate::state::AppState;

/// Longest wait for in-flight requests to finish on shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Change events buffered per [`ServerHandle::subscribe`] receiver.
const CHANGE_CHANNEL_CAPACITY: usize = 100;

/// State of the listener task.
#[derive(Clone, Debug)]
pub enum ListenerStatus {
    /// Bind in progress.
    Binding,
    /// Accepting connections on this address.
    Listening(SocketAddr),
    /// Bind failed; the server serves nothing.
    Failed(BindError),
}

/// Validated, not yet running server.
pub struct LiveReloadServer {
    config: ServerConfig,
    source: Arc<dyn ChangeSource>,
}

impl LiveReloadServer {
    /// Validate `config`.
    ///
    /// The served root must exist and be a directory. Nothing is bound or
    /// watched until [`start`](Self::start).
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        check_root(&config.root)?;

        let source = Arc::new(FsSource::new(config.watcher));
        Ok(Self { config, source })
    }

    /// Replace the filesystem watcher with another change source.
    #[must_use]
    pub fn with_change_source(mut self, source: Arc<dyn ChangeSource>) -> Self {
        self.source = source;
        self
    }

    /// Directory being served.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Arm the change source and spawn the listener.
    ///
    /// Returns once both are started; the outcome of binding is reported by
    /// [`ServerHandle::listening`]. Must be called inside a Tokio runtime.
    pub fn start(self) -> Result<ServerHandle, ServerError> {
        let Self { config, source } = self;

        let (changes, watch) = source.watch(&config.root)?;
        tracing::info!(root = %config.root.display(), "Watching for changes");

        let registry = Arc::new(ReloadRegistry::new());
        let broadcaster = Broadcaster::new(Arc::clone(&registry), config.debounce);
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let forward = tokio::spawn(forward_changes(changes, broadcaster, events.clone()));

        let state = Arc::new(AppState {
            root: config.root.clone(),
            registry: Arc::clone(&registry),
        });
        let router = app::create_router(state);

        let (status_tx, status) = watch::channel(ListenerStatus::Binding);
        let (shutdown, shutdown_rx) = oneshot::channel();
        let listener = tokio::spawn(run_listener(
            config.host.clone(),
            config.port,
            router,
            status_tx,
            shutdown_rx,
        ));

        Ok(ServerHandle {
            root: config.root,
            bind_addr: format!("{}:{}", config.host, config.port),
            registry,
            status,
            events,
            running: Mutex::new(Some(Running {
                shutdown,
                watch,
                forward,
                listener,
            })),
        })
    }
}

fn check_root(root: &Path) -> Result<(), ServerError> {
    match std::fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(ServerError::NotADirectory(root.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(ServerError::RootNotFound(root.to_path_buf()))
        }
        Err(source) => Err(ServerError::Io {
            path: root.to_path_buf(),
            source,
        }),
    }
}

/// Feed change events to the broadcaster and to subscribers, in arrival order.
async fn forward_changes(
    mut changes: ChangeReceiver,
    broadcaster: Broadcaster,
    events: broadcast::Sender<ChangeEvent>,
) {
    while let Some(event) = changes.recv().await {
        tracing::debug!(path = %event.path.display(), kind = ?event.kind, "Change detected");
        broadcaster.notify_change();
        // No subscribers is fine
        events.send(event).ok();
    }
}

async fn run_listener(
    host: String,
    port: u16,
    router: Router,
    status: watch::Sender<ListenerStatus>,
    shutdown: oneshot::Receiver<()>,
) {
    let bind_addr = format!("{host}:{port}");
    let bound = match TcpListener::bind((host.as_str(), port)).await {
        Ok(listener) => listener.local_addr().map(|addr| (listener, addr)),
        Err(err) => Err(err),
    };

    let (listener, addr) = match bound {
        Ok(bound) => bound,
        Err(err) => {
            let err = BindError::new(bind_addr, err);
            tracing::error!(error = %err, "Server failed to start");
            status.send_replace(ListenerStatus::Failed(err));
            return;
        }
    };

    tracing::info!(address = %addr, "Server listening");
    status.send_replace(ListenerStatus::Listening(addr));

    let result = axum::serve(listener, router)
        .with_graceful_shutdown(async {
            shutdown.await.ok();
        })
        .await;
    if let Err(err) = result {
        tracing::error!(error = %err, "Server error");
    }
}

/// Tasks and resources alive while the server runs.
struct Running {
    shutdown: oneshot::Sender<()>,
    watch: WatchHandle,
    forward: JoinHandle<()>,
    listener: JoinHandle<()>,
}

/// Handle to a started server.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) aborts
/// the server tasks without waiting for in-flight requests.
pub struct ServerHandle {
    root: PathBuf,
    bind_addr: String,
    registry: Arc<ReloadRegistry>,
    status: watch::Receiver<ListenerStatus>,
    events: broadcast::Sender<ChangeEvent>,
    running: Mutex<Option<Running>>,
}

impl ServerHandle {
    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until the listener is bound.
    ///
    /// Returns the bound address, or the bind error. Every call reports the
    /// same outcome.
    pub async fn listening(&self) -> Result<SocketAddr, BindError> {
        let mut status = self.status.clone();
        let settled = status
            .wait_for(|status| !matches!(status, ListenerStatus::Binding))
            .await;

        match settled.as_deref() {
            Ok(ListenerStatus::Listening(addr)) => Ok(*addr),
            Ok(ListenerStatus::Failed(err)) => Err(err.clone()),
            // Listener went away while binding
            _ => Err(BindError::new(
                self.bind_addr.clone(),
                io::Error::new(io::ErrorKind::Interrupted, "server stopped before listening"),
            )),
        }
    }

    /// Bound address, once listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match *self.status.borrow() {
            ListenerStatus::Listening(addr) => Some(addr),
            _ => None,
        }
    }

    /// Receive every change event seen after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Directory being served.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of open live reload connections.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.running().is_none()
    }

    /// Stop the server.
    ///
    /// Stops accepting connections, stops watching, closes every live
    /// reload connection, then waits up to five seconds for in-flight
    /// requests. Calling it again does nothing.
    pub async fn shutdown(&self) {
        let Some(running) = self.running().take() else {
            return;
        };
        let Running {
            shutdown,
            watch,
            forward,
            mut listener,
        } = running;

        shutdown.send(()).ok();
        watch.stop();
        forward.abort();
        self.registry.close_all();

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut listener)
            .await
            .is_err()
        {
            tracing::warn!(timeout = ?SHUTDOWN_TIMEOUT, "Graceful shutdown timed out");
            listener.abort();
        }
        tracing::info!("Server stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Some(running) = self.running().take() {
            running.forward.abort();
            running.listener.abort();
            self.registry.close_all();
        }
    }
}
