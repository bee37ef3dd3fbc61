//! Concurrent car-rental daemon.
//!
//! The daemon serves a line-oriented TCP protocol for renting and
//! managing a shared vehicle fleet configured via [`fleet_config`].
//! Each accepted connection gets its own session and thread; all
//! vehicle state lives in a single lock-guarded registry, so commands
//! from concurrent sessions are linearizable and two clients racing to
//! reserve the same car resolve with exactly one winner.
//!
//! Connections progress through a small role state machine (register as
//! renter or owner, then reserve, actuate, pay, and end the rental, or
//! manage prices of owned cars). Dropped connections release whatever
//! the session still held, so no vehicle stays reserved for a dead
//! client.

pub mod bootstrap;
pub mod dispatch;
pub mod location;
pub mod registry;
pub mod session;
pub mod telemetry;
pub mod transport;

pub use bootstrap::{BootstrapError, Daemon, bootstrap};
pub use dispatch::{DispatchError, SessionConnectionHandler};
pub use location::{LocationProvider, NullLocationProvider, StaticLocationProvider};
pub use registry::{RegistryError, Vehicle, VehicleId, VehicleRegistry};
pub use session::{Role, SessionError, SessionId, SessionManager};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ConnectionHandler, ListenerError, ListenerHandle, SocketListener};
