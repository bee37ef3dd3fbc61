use thiserror::Error;

use super::vehicle::VehicleId;
use crate::session::SessionId;

/// Errors surfaced by registry operations.
///
/// These are recoverable protocol-level failures; the dispatcher maps
/// them to canonical response strings and the connection stays open.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No vehicle with the given id exists.
    #[error("vehicle {id} not found")]
    NotFound { id: VehicleId },
    /// The vehicle is reserved by another session.
    #[error("vehicle {id} is already reserved")]
    AlreadyReserved { id: VehicleId },
    /// The session already holds a reservation on another vehicle.
    #[error("session {session} already holds a reservation")]
    AlreadyRenting { session: SessionId },
    /// The caller is neither the vehicle's renter nor its owner, as the
    /// operation requires.
    #[error("operation on vehicle {id} is not permitted for this caller")]
    Forbidden { id: VehicleId },
    /// The rental has not been paid yet.
    #[error("rental for vehicle {id} has not been paid")]
    NotPaid { id: VehicleId },
    /// The vehicle table lock was poisoned by a panicking thread.
    #[error("vehicle table lock poisoned")]
    Poisoned,
}
