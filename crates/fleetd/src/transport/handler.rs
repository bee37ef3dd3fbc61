use std::net::TcpStream;

/// Handles accepted client connections.
///
/// The listener invokes `handle` on a dedicated thread per connection;
/// the implementation owns the stream until it returns and should avoid
/// panicking.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Serves one connection until it closes.
    fn handle(&self, stream: TcpStream);
}
