use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum AppError {
    /// The daemon address did not resolve.
    #[error("failed to resolve '{endpoint}': {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },
    /// Connecting to the daemon failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// The connection dropped mid-exchange.
    #[error("connection to the daemon failed: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    /// The daemon closed the connection before answering.
    #[error("the daemon closed the connection")]
    ConnectionClosed,
}
