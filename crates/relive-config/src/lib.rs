//! `relive.toml` loading.
//!
//! A project keeps its dev server settings in a `relive.toml` next to (or
//! above) the directory it serves. Every section and key is optional:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [serve]
//! root = "public"      # relative to the directory holding relive.toml
//!
//! [live_reload]
//! debounce_ms = 500
//! watcher = "native"   # or "poll"
//! poll_interval_ms = 1000
//! ```
//!
//! `server.host` and `serve.root` may reference environment variables as
//! `${VAR}` or `${VAR:-fallback}`; `serve.root` may also start with `~`.
//! Command-line flags arrive as [`CliSettings`] and win over the file.

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name looked up in the working directory and its ancestors.
const CONFIG_FILENAME: &str = "relive.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DEBOUNCE_MS: u64 = 500;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Values given on the command line. `None` keeps what the file says.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Directory to serve; used as given, not relative to the config file.
    pub root: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub watcher: Option<WatcherKind>,
    pub poll_interval_ms: Option<u64>,
}

/// Settings for one `relive serve` run.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    serve: ServeSection,
    pub live_reload: LiveReloadConfig,

    /// Directory to serve, resolved against the config file location.
    #[serde(skip)]
    pub root: PathBuf,
    /// File the settings came from, if any.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::serving(Path::new("."))
    }
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

/// `[serve]` section. `root` stays a string until expanded and resolved.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ServeSection {
    root: Option<String>,
}

/// How file changes are detected.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WatcherKind {
    /// OS change notifications.
    #[default]
    Native,
    /// Rescan the tree every `poll_interval_ms`.
    Poll,
}

/// `[live_reload]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Minimum time between two reloads; 0 reloads on every change.
    pub debounce_ms: u64,
    pub watcher: WatcherKind,
    /// Only used with [`WatcherKind::Poll`].
    pub poll_interval_ms: u64,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            watcher: WatcherKind::Native,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Why settings could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `--config` points at a missing file.
    #[error("Config file {} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid relive.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("Invalid setting: {0}")]
    Validation(String),
    /// `${VAR}` without fallback and VAR unset.
    #[error("Cannot expand {field}: {message}")]
    EnvVar { field: String, message: String },
}

impl Config {
    /// Build the settings for this run.
    ///
    /// Reads `config_path` when given. Otherwise the nearest `relive.toml`
    /// from the working directory upward is used, and without one the
    /// working directory is served with defaults. `cli` is applied last and
    /// checked like file values.
    pub fn load(
        config_path: Option<&Path>,
        cli: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => find_upward(&std::env::current_dir()?),
        };

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::serving(&std::env::current_dir()?),
        };

        if let Some(cli) = cli {
            config.apply(cli);
            config.validate()?;
        }
        Ok(config)
    }

    /// Defaults, serving `root`.
    fn serving(root: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            serve: ServeSection::default(),
            live_reload: LiveReloadConfig::default(),
            root: root.to_path_buf(),
            config_path: None,
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        // Absolute, so a bare `relive.toml` still has a parent directory
        let path = std::path::absolute(path)?;
        let mut config: Self = toml::from_str(&std::fs::read_to_string(&path)?)?;

        config.server.host = expand::expand_env(&config.server.host, "server.host")?;
        if let Some(root) = &config.serve.root {
            config.serve.root = Some(expand::expand_path(root, "serve.root")?);
        }

        config.resolve_root(path.parent().unwrap_or(Path::new(".")));
        config.config_path = Some(path);
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, cli: &CliSettings) {
        if let Some(host) = &cli.host {
            self.server.host.clone_from(host);
        }
        if let Some(root) = &cli.root {
            self.root.clone_from(root);
        }
        self.server.port = cli.port.unwrap_or(self.server.port);
        self.live_reload.debounce_ms = cli.debounce_ms.unwrap_or(self.live_reload.debounce_ms);
        self.live_reload.watcher = cli.watcher.unwrap_or(self.live_reload.watcher);
        self.live_reload.poll_interval_ms =
            cli.poll_interval_ms.unwrap_or(self.live_reload.poll_interval_ms);
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::Validation("server.host cannot be empty".to_owned()));
        }
        // The OS would pick a free port, which nobody could find in a browser
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port cannot be 0".to_owned()));
        }
        if self.live_reload.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "live_reload.poll_interval_ms must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// `serve.root` joined onto `config_dir`, or `config_dir` itself.
    fn resolve_root(&mut self, config_dir: &Path) {
        self.root = match self.serve.root.as_deref() {
            Some(root) => config_dir.join(root),
            None => config_dir.to_path_buf(),
        };
    }
}

/// Nearest `relive.toml` in `start` or one of its ancestors.
fn find_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}
