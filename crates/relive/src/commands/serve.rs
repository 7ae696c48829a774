//! `relive serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use relive_config::{CliSettings, Config, WatcherKind};
use relive_server::{LiveReloadServer, server_config_from_relive_config};
use tokio::sync::broadcast::error::RecvError;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Directory to serve (default: `serve.root` from config, or the current directory).
    dir: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover relive.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long, env = "RELIVE_PORT")]
    port: Option<u16>,

    /// Minimum milliseconds between two reloads, 0 to reload on every change (overrides config).
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Detect changes by rescanning instead of native notifications.
    #[arg(long)]
    poll: bool,

    /// Milliseconds between rescans with --poll (overrides config).
    #[arg(long, requires = "poll")]
    poll_interval_ms: Option<u64>,

    /// Enable verbose output (request and reload logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// Runs until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let root = match self.dir {
            Some(dir) => Some(std::env::current_dir()?.join(dir)),
            None => None,
        };

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            root,
            debounce_ms: self.debounce_ms,
            watcher: self.poll.then_some(WatcherKind::Poll),
            poll_interval_ms: self.poll_interval_ms,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let server = LiveReloadServer::new(server_config_from_relive_config(&config))?;
        let handle = server.start()?;
        let mut changes = handle.subscribe();

        match handle.listening().await {
            Ok(addr) => output.listening(&format!("http://{addr}")),
            Err(err) => {
                handle.shutdown().await;
                return Err(err.into());
            }
        }

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let outcome = loop {
            tokio::select! {
                result = &mut ctrl_c => break result,
                change = changes.recv() => match change {
                    Ok(event) => output.change(&event, handle.root()),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Change output fell behind");
                    }
                    Err(RecvError::Closed) => break Ok(()),
                },
            }
        };

        tracing::info!("Shutdown signal received, stopping server...");
        handle.shutdown().await;
        outcome.map_err(CliError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    fn parse(args: &[&str]) -> ServeArgs {
        TestCli::try_parse_from(std::iter::once("relive").chain(args.iter().copied()))
            .unwrap()
            .serve
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);

        assert!(args.dir.is_none());
        assert!(!args.poll);
        assert!(!args.verbose);
    }

    #[test]
    fn test_dir_and_overrides() {
        let args = parse(&["public", "-p", "3000", "--debounce-ms", "0", "-v"]);

        assert_eq!(args.dir, Some(PathBuf::from("public")));
        assert_eq!(args.port, Some(3000));
        assert_eq!(args.debounce_ms, Some(0));
        assert!(args.verbose);
    }

    #[test]
    fn test_poll_interval_requires_poll() {
        let result = TestCli::try_parse_from(["relive", "--poll-interval-ms", "200"]);
        assert!(result.is_err());

        let args = parse(&["--poll", "--poll-interval-ms", "200"]);
        assert!(args.poll);
        assert_eq!(args.poll_interval_ms, Some(200));
    }
}
