//! skt-server: multi-connection TCP acknowledgement server.
//!
//! Accepts any number of clients on one thread.  Every message a client sends
//! is logged and answered: the first with `Connect OK`, the rest with `ACK`.
//!
//! # Usage
//!
//! ```text
//! skt-server <PORT> [ADDRESS] [OPTIONS]
//!
//! Arguments:
//!   <PORT>     TCP port to listen on (may come from --config instead)
//!   [ADDRESS]  IPv4 interface to bind; invalid values fall back to all
//!              interfaces with a warning
//!
//! Options:
//!   --config <FILE>             TOML configuration file
//!   --poll-timeout-secs <SECS>  Upper bound on one readiness wait [default: 5]
//!   --backlog <N>               Pending-connection queue length [default: 64]
//!   --log-level <LEVEL>         Used when RUST_LOG is unset [default: info]
//! ```
//!
//! Command-line values override the configuration file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use skt_server::domain::{parse_bind_address, AddressError, ServerConfig};
use skt_server::infrastructure::{load_config, FileConfig, Server};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "skt-server",
    about = "Single-threaded multi-connection TCP server that acknowledges every message",
    version
)]
struct Cli {
    /// TCP port to listen on.
    #[arg(required_unless_present = "config")]
    port: Option<u16>,

    /// IPv4 address of the interface to bind (8 to 16 characters).
    address: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long, env = "SKT_CONFIG")]
    config: Option<PathBuf>,

    /// Upper bound on one readiness wait, in seconds.
    #[arg(long, env = "SKT_POLL_TIMEOUT_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    poll_timeout_secs: Option<u64>,

    /// Length of the pending-connection queue.
    #[arg(long, env = "SKT_BACKLOG")]
    backlog: Option<u32>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "SKT_LOG_LEVEL")]
    log_level: Option<String>,
}

/// Everything `main` needs after merging the CLI with the config file.
#[derive(Debug)]
struct Settings {
    server: ServerConfig,
    log_level: String,
    /// Set when a bind address was given but rejected.
    address_rejected: Option<AddressError>,
}

impl Cli {
    /// Merges CLI arguments over the file configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no port is given anywhere or the file sets a zero
    /// poll timeout.
    fn into_settings(self, file: FileConfig) -> anyhow::Result<Settings> {
        let Some(port) = self.port.or(file.server.port) else {
            bail!("no port given on the command line or in the config file");
        };
        let poll_timeout_secs = self
            .poll_timeout_secs
            .unwrap_or(file.server.poll_timeout_secs);
        if poll_timeout_secs == 0 {
            bail!("poll_timeout_secs must be at least 1");
        }

        let mut server = ServerConfig::new(port)
            .with_backlog(self.backlog.unwrap_or(file.server.backlog))
            .with_poll_timeout(Duration::from_secs(poll_timeout_secs));

        let mut address_rejected = None;
        if let Some(raw) = self.address.or(file.server.bind_address) {
            match parse_bind_address(&raw) {
                Ok(ip) => server = server.with_bind_address(ip),
                Err(e) => address_rejected = Some(e),
            }
        }

        Ok(Settings {
            server,
            log_level: self.log_level.unwrap_or(file.logging.level),
            address_rejected,
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// 1. Parse the CLI and the optional config file.
/// 2. Initialise `tracing` (`RUST_LOG` wins over the configured level).
/// 3. Bind the listener and build the event loop.
/// 4. Run the loop on a blocking thread; Ctrl+C wakes it and stops it.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let file = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FileConfig::default(),
    };
    let settings = cli.into_settings(file)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    match (&settings.address_rejected, settings.server.bind_address) {
        (Some(e), _) => warn!("{e}; binding to all interfaces"),
        (None, Some(ip)) => info!("binding to interface {ip}"),
        (None, None) => info!("binding to all interfaces"),
    }

    let server = Server::bind(&settings.server).context("failed to start server")?;
    info!("skt-server listening on {}", server.local_addr());

    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                shutdown.request_shutdown();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // The event loop blocks in the readiness wait, so it gets its own thread.
    let stats = tokio::task::spawn_blocking(move || server.run())
        .await
        .context("event loop thread panicked")?
        .context("event loop failed")?;

    info!(
        accepted = stats.accepted,
        evicted = stats.evicted,
        messages = stats.messages,
        "skt-server stopped"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use skt_server::infrastructure::parse_config;

    use super::*;

    fn settings(args: &[&str], file: FileConfig) -> anyhow::Result<Settings> {
        let mut argv = vec!["skt-server"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)?.into_settings(file)
    }

    #[test]
    fn test_cli_requires_port_without_config() {
        assert!(Cli::try_parse_from(["skt-server"]).is_err());
    }

    #[test]
    fn test_cli_rejects_non_numeric_port() {
        assert!(Cli::try_parse_from(["skt-server", "http"]).is_err());
    }

    #[test]
    fn test_cli_rejects_zero_poll_timeout() {
        let result = Cli::try_parse_from(["skt-server", "4549", "--poll-timeout-secs", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_port_only_uses_defaults() {
        // Arrange / Act
        let s = settings(&["4549"], FileConfig::default()).unwrap();

        // Assert
        assert_eq!(s.server, ServerConfig::new(4549));
        assert_eq!(s.log_level, "info");
        assert!(s.address_rejected.is_none());
    }

    #[test]
    fn test_valid_address_is_bound() {
        let s = settings(&["4549", "127.0.0.1"], FileConfig::default()).unwrap();
        assert_eq!(s.server.bind_address, Some(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_short_address_falls_back_to_any_interface() {
        let s = settings(&["4549", "1.2.3.4"], FileConfig::default()).unwrap();
        assert_eq!(s.server.bind_address, None);
        assert!(matches!(
            s.address_rejected,
            Some(AddressError::InvalidLength { len: 7, .. })
        ));
    }

    #[test]
    fn test_malformed_address_falls_back_to_any_interface() {
        let s = settings(&["4549", "localhost"], FileConfig::default()).unwrap();
        assert_eq!(s.server.listen_addr().to_string(), "0.0.0.0:4549");
        assert!(s.address_rejected.is_some());
    }

    #[test]
    fn test_file_supplies_port_and_settings() {
        // Arrange
        let file = parse_config(
            "[server]\nport = 7000\nbind_address = \"127.0.0.1\"\nbacklog = 8\npoll_timeout_secs = 2\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        // Act
        let s = settings(&["--config", "unused.toml"], file).unwrap();

        // Assert
        assert_eq!(s.server.port, 7000);
        assert_eq!(s.server.bind_address, Some(Ipv4Addr::LOCALHOST));
        assert_eq!(s.server.backlog, 8);
        assert_eq!(s.server.poll_timeout, Duration::from_secs(2));
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = parse_config("[server]\nport = 7000\nbacklog = 8\n").unwrap();

        let s = settings(
            &["9000", "--backlog", "32", "--poll-timeout-secs", "1", "--log-level", "warn"],
            file,
        )
        .unwrap();

        assert_eq!(s.server.port, 9000);
        assert_eq!(s.server.backlog, 32);
        assert_eq!(s.server.poll_timeout, Duration::from_secs(1));
        assert_eq!(s.log_level, "warn");
    }

    #[test]
    fn test_config_without_port_is_an_error() {
        let result = settings(&["--config", "unused.toml"], FileConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_poll_timeout_in_file_is_an_error() {
        let file = parse_config("[server]\npoll_timeout_secs = 0\n").unwrap();
        assert!(settings(&["4549"], file).is_err());
    }
}
