//! Shared configuration for the fleet daemon and its client.
//!
//! Both binaries agree on the listen address, logging settings, and the
//! fleet seed through the types exported here. Values are resolved from
//! command-line flags with environment-variable fallbacks
//! (`FLEETD_LISTEN`, `FLEETD_LOG`, `FLEETD_LOG_FORMAT`,
//! `FLEETD_FLEET_FILE`).

mod config;
mod defaults;
mod fleet;
mod listen;
mod logging;

pub use config::Config;
pub use defaults::{DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT};
pub use fleet::{FleetSeed, FleetSeedError, VehicleSeed};
pub use listen::{ListenAddr, ListenAddrParseError};
pub use logging::{LogFormat, LogFormatParseError};
