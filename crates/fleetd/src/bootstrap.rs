//! Daemon bootstrap orchestration.
//!
//! Bootstrap turns a resolved [`Config`] into a ready-to-serve daemon:
//! telemetry first so later stages can log, then the fleet seed, then
//! the shared registry and session manager. Serving binds the listener
//! and hands connections to the dispatch handler.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use fleet_config::{Config, FleetSeed, FleetSeedError};

use crate::dispatch::SessionConnectionHandler;
use crate::location::NullLocationProvider;
use crate::registry::VehicleRegistry;
use crate::session::SessionManager;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{ListenerError, ListenerHandle, SocketListener};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Errors surfaced during bootstrap and serve.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The fleet seed could not be loaded or validated.
    #[error("failed to load fleet seed: {source}")]
    FleetSeed {
        /// Underlying seed error.
        #[source]
        source: FleetSeedError,
    },
    /// The listener socket could not be bound or started.
    #[error("failed to start listener: {source}")]
    Listener {
        /// Underlying listener error.
        #[source]
        source: ListenerError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    registry: Arc<VehicleRegistry>,
    sessions: Arc<SessionManager>,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the shared vehicle registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<VehicleRegistry> {
        &self.registry
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the configured address and starts accepting connections.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Listener`] when the socket cannot be
    /// bound.
    pub fn serve(self) -> Result<ListenerHandle, BootstrapError> {
        let listener = SocketListener::bind(self.config.listen())
            .map_err(|source| BootstrapError::Listener { source })?;
        if let Some(addr) = listener.local_addr() {
            info!(target: BOOTSTRAP_TARGET, %addr, "daemon listening");
        }
        let handler = SessionConnectionHandler::new(
            self.registry,
            self.sessions,
            Arc::new(NullLocationProvider),
        );
        listener
            .start(Arc::new(handler))
            .map_err(|source| BootstrapError::Listener { source })
    }
}

/// Bootstraps the daemon from a resolved configuration.
///
/// # Errors
///
/// Returns an error when telemetry cannot be installed or the fleet
/// seed fails to load.
pub fn bootstrap(config: Config) -> Result<Daemon, BootstrapError> {
    let telemetry = telemetry::initialise(&config)
        .map_err(|source| BootstrapError::Telemetry { source })?;

    let seed = match config.fleet_file() {
        Some(path) => {
            FleetSeed::from_file(path).map_err(|source| BootstrapError::FleetSeed { source })?
        }
        None => FleetSeed::builtin(),
    };
    info!(
        target: BOOTSTRAP_TARGET,
        vehicles = seed.len(),
        "fleet seed loaded"
    );

    let registry = Arc::new(VehicleRegistry::from_seed(&seed));
    let sessions = Arc::new(SessionManager::new());

    Ok(Daemon {
        config,
        registry,
        sessions,
        telemetry,
    })
}
