//! Connection and framing for talking to the daemon.
//!
//! Requests are single lines; responses are zero or more payload lines
//! closed by one empty line. The client reads exactly one framed
//! response per command sent.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use fleet_config::ListenAddr;

use crate::errors::AppError;

const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// One framed exchange's outcome.
#[derive(Debug, PartialEq, Eq)]
pub enum Exchange {
    /// Response payload lines; the connection remains open.
    Reply(Vec<String>),
    /// The daemon closed the connection.
    Closed,
}

/// Line-oriented client connection to the daemon.
pub struct Connection {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Connection {
    /// Connects to the daemon at the given address.
    pub fn open(addr: &ListenAddr) -> Result<Self, AppError> {
        let address = resolve(addr)?;
        let stream = TcpStream::connect_timeout(&address, CONNECTION_TIMEOUT).map_err(
            |source| AppError::Connect {
                addr: address,
                source,
            },
        )?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self { stream, reader })
    }

    /// Sends one command line and reads the framed response.
    ///
    /// Writing to a connection the daemon has already closed (after a
    /// completed rental) reports [`Exchange::Closed`] rather than an
    /// error.
    pub fn exchange(&mut self, command: &str) -> Result<Exchange, AppError> {
        let sent = self
            .stream
            .write_all(command.as_bytes())
            .and_then(|()| self.stream.write_all(b"\n"))
            .and_then(|()| self.stream.flush());
        match sent {
            Ok(()) => self.read_response(),
            Err(error)
                if matches!(
                    error.kind(),
                    std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset
                ) =>
            {
                Ok(Exchange::Closed)
            }
            Err(error) => Err(error.into()),
        }
    }

    fn read_response(&mut self) -> Result<Exchange, AppError> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line)?;
            if read == 0 {
                // EOF inside a response means the final response was
                // already complete and the daemon hung up.
                if lines.is_empty() {
                    return Ok(Exchange::Closed);
                }
                return Err(AppError::ConnectionClosed);
            }
            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                return Ok(Exchange::Reply(lines));
            }
            lines.push(trimmed.to_string());
        }
    }
}

fn resolve(addr: &ListenAddr) -> Result<SocketAddr, AppError> {
    let endpoint = addr.to_string();
    let mut candidates = (addr.host(), addr.port())
        .to_socket_addrs()
        .map_err(|source| AppError::Resolve {
            endpoint: endpoint.clone(),
            source,
        })?;
    candidates
        .find(|candidate| matches!(candidate, SocketAddr::V4(_) | SocketAddr::V6(_)))
        .ok_or_else(|| AppError::Resolve {
            endpoint,
            source: std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "no resolved addresses",
            ),
        })
}
