//! skt-client: sends text to an skt-server.
//!
//! # Usage
//!
//! ```text
//! skt-client <HOST> <PORT> [OPTIONS]
//!
//! Arguments:
//!   <HOST>  Server host name or IP address
//!   <PORT>  Server port
//!
//! Options:
//!   --message <TEXT>        Message repeated in repeat mode [default: hello]
//!   --interval-secs <SECS>  Seconds between repeated messages [default: 5]
//!   --count <N>             Stop after N messages (repeat mode)
//!   --interactive           Send lines typed on stdin; "quit" exits
//!   --await-reply           Read and log the server's reply to each message
//! ```

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use skt_client::application::ClientSession;
use skt_client::domain::{ClientConfig, SendMode, DEFAULT_MESSAGE};
use skt_client::infrastructure::connect;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "skt-client",
    about = "Connects to an skt-server and sends messages",
    version
)]
struct Cli {
    /// Server host name or IP address.
    host: String,

    /// Server port.
    port: u16,

    /// Message sent in repeat mode.
    #[arg(long, default_value = DEFAULT_MESSAGE, env = "SKT_MESSAGE")]
    message: String,

    /// Seconds between repeated messages.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: u64,

    /// Stop after this many messages.
    #[arg(long)]
    count: Option<u64>,

    /// Send lines typed on stdin instead of repeating one message.
    #[arg(long, conflicts_with_all = ["message", "count"])]
    interactive: bool,

    /// Read and log the server's reply after every message.
    #[arg(long)]
    await_reply: bool,
}

impl Cli {
    fn into_client_config(self) -> ClientConfig {
        let mode = if self.interactive {
            SendMode::Interactive
        } else {
            SendMode::Repeat {
                message: self.message,
                interval: Duration::from_secs(self.interval_secs),
                limit: self.count,
            }
        };
        ClientConfig {
            host: self.host,
            port: self.port,
            mode,
            await_reply: self.await_reply,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_client_config();
    let stream = connect(&config.host, config.port)
        .await
        .with_context(|| format!("could not reach {}", config.target()))?;
    let mut session = ClientSession::new(stream).with_await_reply(config.await_reply);

    let outcome = match &config.mode {
        SendMode::Repeat {
            message,
            interval,
            limit,
        } => {
            tokio::select! {
                result = session.run_repeat(message, *interval, *limit) => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            }
        }
        SendMode::Interactive => {
            let stdin = BufReader::new(tokio::io::stdin());
            tokio::select! {
                result = session.run_interactive(stdin, tokio::io::stdout()) => Some(result),
                _ = tokio::signal::ctrl_c() => None,
            }
        }
    };

    match outcome {
        Some(result) => {
            result.context("session failed")?;
        }
        None => info!("received Ctrl+C"),
    }

    let sent = session.sent();
    if let Err(e) = session.close().await {
        warn!("{e}");
    }
    info!(sent, "EXIT program");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_host_and_port() {
        assert!(Cli::try_parse_from(["skt-client"]).is_err());
        assert!(Cli::try_parse_from(["skt-client", "localhost"]).is_err());
    }

    #[test]
    fn test_cli_defaults_to_repeat_mode() {
        // Arrange
        let cli = Cli::parse_from(["skt-client", "localhost", "4549"]);

        // Act
        let config = cli.into_client_config();

        // Assert
        assert_eq!(config, ClientConfig::new("localhost", 4549));
    }

    #[test]
    fn test_cli_repeat_overrides() {
        let cli = Cli::parse_from([
            "skt-client",
            "10.0.0.5",
            "9000",
            "--message",
            "status",
            "--interval-secs",
            "2",
            "--count",
            "10",
            "--await-reply",
        ]);

        let config = cli.into_client_config();

        assert_eq!(
            config.mode,
            SendMode::Repeat {
                message: "status".to_string(),
                interval: Duration::from_secs(2),
                limit: Some(10),
            }
        );
        assert!(config.await_reply);
    }

    #[test]
    fn test_cli_interactive_mode() {
        let cli = Cli::parse_from(["skt-client", "localhost", "4549", "--interactive"]);
        assert_eq!(cli.into_client_config().mode, SendMode::Interactive);
    }

    #[test]
    fn test_cli_interactive_conflicts_with_message() {
        let result = Cli::try_parse_from([
            "skt-client",
            "localhost",
            "4549",
            "--interactive",
            "--message",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_zero_interval() {
        let result = Cli::try_parse_from(["skt-client", "localhost", "4549", "--interval-secs", "0"]);
        assert!(result.is_err());
    }
}
