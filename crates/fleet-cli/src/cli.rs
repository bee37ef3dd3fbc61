use clap::Parser;

use fleet_config::ListenAddr;

/// Command-line client for the fleet daemon.
///
/// With positional commands it runs them in order and exits; without
/// any it reads commands from standard input until the stream ends or
/// the daemon closes the connection.
#[derive(Debug, Parser)]
#[command(name = "fleet", version, about = "Client for the fleet rental daemon")]
pub struct Cli {
    /// Daemon address, as `host:port`.
    #[arg(long, env = "FLEETD_LISTEN", default_value_t = ListenAddr::default())]
    pub connect: ListenAddr,

    /// Commands to send, one per argument.
    #[arg(value_name = "COMMAND")]
    pub commands: Vec<String>,
}
