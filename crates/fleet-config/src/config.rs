use camino::Utf8PathBuf;
use clap::Parser;

use crate::defaults;
use crate::listen::ListenAddr;
use crate::logging::LogFormat;

/// Resolved daemon configuration.
///
/// Values come from command-line flags, falling back to environment
/// variables and finally to the built-in defaults. The struct doubles as
/// the clap definition for the `fleetd` binary.
#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(name = "fleetd", version, about = "Shared vehicle fleet daemon")]
pub struct Config {
    /// Address to listen on, as `host:port`.
    #[arg(long, env = "FLEETD_LISTEN", default_value_t = ListenAddr::default())]
    pub listen: ListenAddr,

    /// Tracing filter expression (for example `info` or `fleetd=debug`).
    #[arg(
        long = "log-filter",
        env = "FLEETD_LOG",
        default_value = defaults::DEFAULT_LOG_FILTER
    )]
    pub log_filter: String,

    /// Log output format.
    #[arg(long = "log-format", env = "FLEETD_LOG_FORMAT", default_value_t)]
    pub log_format: LogFormat,

    /// JSON file describing the vehicle fleet created at startup.
    /// The built-in fleet is used when omitted.
    #[arg(long = "fleet-file", env = "FLEETD_FLEET_FILE")]
    pub fleet_file: Option<Utf8PathBuf>,
}

impl Config {
    /// Configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Configured log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Configured listen address.
    #[must_use]
    pub fn listen(&self) -> &ListenAddr {
        &self.listen
    }

    /// Path of the fleet seed file, when one was configured.
    #[must_use]
    pub fn fleet_file(&self) -> Option<&Utf8PathBuf> {
        self.fleet_file.as_ref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenAddr::default(),
            log_filter: defaults::DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::default(),
            fleet_file: None,
        }
    }
}
