//! TCP connection to the server.
//!
//! The host is resolved by name; every resolved address is tried in turn
//! until one accepts the connection.

use tokio::net::{lookup_host, TcpStream};
use tracing::{debug, info};

use crate::application::session::ClientError;

/// Resolves `host` and connects to the first address that answers.
///
/// # Errors
///
/// Returns [`ClientError::Resolve`] if the name does not resolve to any
/// address, or [`ClientError::Connect`] carrying the last connect error.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, ClientError> {
    let target = format!("{host}:{port}");
    let addrs: Vec<_> = lookup_host((host, port))
        .await
        .map_err(|source| ClientError::Resolve {
            target: target.clone(),
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(ClientError::Resolve {
            target,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
        });
    }

    let mut last_error = None;
    for addr in addrs {
        debug!(%addr, "connecting");
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!(%addr, "connected to {target}");
                return Ok(stream);
            }
            Err(e) => last_error = Some(e),
        }
    }
    Err(ClientError::Connect {
        target,
        source: last_error
            .unwrap_or_else(|| std::io::Error::from(std::io::ErrorKind::AddrNotAvailable)),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
