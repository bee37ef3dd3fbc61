use crate::listen::ListenAddr;

/// Default host the daemon binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default TCP port the daemon listens on.
pub const DEFAULT_TCP_PORT: u16 = 12345;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Computes the default listen address for the daemon.
pub fn default_listen_addr() -> ListenAddr {
    ListenAddr::new(DEFAULT_HOST, DEFAULT_TCP_PORT)
}
