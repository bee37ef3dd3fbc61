use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::defaults;

/// TCP address the daemon listens on, written as `host:port`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ListenAddr {
    host: String,
    port: u16,
}

impl ListenAddr {
    /// Builds a listen address from a host and port.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port. A port of `0` requests an ephemeral port from the OS.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for ListenAddr {
    fn default() -> Self {
        defaults::default_listen_addr()
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ListenAddr {
    type Err = ListenAddrParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        // rsplit so IPv6 literals like `::1:8080` keep their final segment
        // as the port.
        let (host, port) = input
            .rsplit_once(':')
            .ok_or_else(|| ListenAddrParseError::MissingPort(input.to_string()))?;
        if host.is_empty() {
            return Err(ListenAddrParseError::MissingHost(input.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| ListenAddrParseError::InvalidPort(port.to_string()))?;
        Ok(Self::new(host, port))
    }
}

/// Errors encountered while parsing a [`ListenAddr`] from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListenAddrParseError {
    /// No `:port` suffix was present.
    #[error("missing TCP port in '{0}'")]
    MissingPort(String),
    /// The host part before the colon was empty.
    #[error("missing host in '{0}'")]
    MissingHost(String),
    /// The port suffix was not a valid 16-bit integer.
    #[error("invalid TCP port '{0}'")]
    InvalidPort(String),
}
