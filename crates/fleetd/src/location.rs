//! Injectable vehicle location lookup.
//!
//! Listings may carry a display-only location string. The lookup is a
//! collaborator injected into the dispatcher so the registry and protocol
//! logic never touch the network and stay deterministic under test. A
//! missing location is normal and never fails a command.

use std::collections::HashMap;

use crate::registry::VehicleId;

/// Supplies an optional display location for a vehicle.
pub trait LocationProvider: Send + Sync + 'static {
    /// Returns the vehicle's location, or `None` when unknown.
    fn locate(&self, vehicle: VehicleId) -> Option<String>;
}

/// Provider that knows no locations. The daemon default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLocationProvider;

impl LocationProvider for NullLocationProvider {
    fn locate(&self, _vehicle: VehicleId) -> Option<String> {
        None
    }
}

/// Provider backed by a fixed table, for tests and demos.
#[derive(Debug, Default)]
pub struct StaticLocationProvider {
    locations: HashMap<VehicleId, String>,
}

impl StaticLocationProvider {
    /// Records a location for a vehicle.
    pub fn insert(&mut self, vehicle: VehicleId, location: impl Into<String>) {
        self.locations.insert(vehicle, location.into());
    }
}

impl FromIterator<(VehicleId, String)> for StaticLocationProvider {
    fn from_iter<I: IntoIterator<Item = (VehicleId, String)>>(iter: I) -> Self {
        Self {
            locations: iter.into_iter().collect(),
        }
    }
}

impl LocationProvider for StaticLocationProvider {
    fn locate(&self, vehicle: VehicleId) -> Option<String> {
        self.locations.get(&vehicle).cloned()
    }
}
