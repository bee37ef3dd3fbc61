//! Fleet seed: the set of vehicles created when the daemon starts.
//!
//! The fleet is fixed for the lifetime of the process. It is either read
//! from a JSON file (an array of seed objects) or falls back to a small
//! built-in fleet so the daemon is usable out of the box.

use std::collections::HashSet;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One vehicle record in the fleet seed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VehicleSeed {
    pub id: u32,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub price: u32,
    pub owner_id: u32,
}

/// Validated collection of vehicle seeds with unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSeed {
    vehicles: Vec<VehicleSeed>,
}

impl FleetSeed {
    /// Builds a seed from vehicle records, rejecting duplicate ids.
    pub fn from_vehicles(vehicles: Vec<VehicleSeed>) -> Result<Self, FleetSeedError> {
        let mut seen = HashSet::new();
        for vehicle in &vehicles {
            if !seen.insert(vehicle.id) {
                return Err(FleetSeedError::DuplicateId { id: vehicle.id });
            }
        }
        Ok(Self { vehicles })
    }

    /// Reads and validates a seed from a JSON file.
    pub fn from_file(path: &Utf8Path) -> Result<Self, FleetSeedError> {
        let contents = fs::read_to_string(path).map_err(|source| FleetSeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let vehicles: Vec<VehicleSeed> =
            serde_json::from_str(&contents).map_err(|source| FleetSeedError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_vehicles(vehicles)
    }

    /// The built-in default fleet.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            vehicles: vec![
                VehicleSeed {
                    id: 1,
                    brand: "Audi".to_string(),
                    model: "A4".to_string(),
                    year: 2019,
                    price: 100,
                    owner_id: 11,
                },
                VehicleSeed {
                    id: 2,
                    brand: "BMW".to_string(),
                    model: "X5".to_string(),
                    year: 2020,
                    price: 150,
                    owner_id: 12,
                },
                VehicleSeed {
                    id: 3,
                    brand: "Mercedes".to_string(),
                    model: "E200".to_string(),
                    year: 2018,
                    price: 120,
                    owner_id: 13,
                },
            ],
        }
    }

    /// Seed records in declaration order.
    #[must_use]
    pub fn vehicles(&self) -> &[VehicleSeed] {
        &self.vehicles
    }

    /// Number of vehicles in the seed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the seed contains no vehicles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

/// Errors encountered while loading a fleet seed.
#[derive(Debug, Error)]
pub enum FleetSeedError {
    /// Reading the seed file failed.
    #[error("failed to read fleet file '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The seed file was not a valid JSON array of vehicles.
    #[error("failed to parse fleet file '{path}': {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Two seed records shared a vehicle id.
    #[error("duplicate vehicle id {id} in fleet seed")]
    DuplicateId { id: u32 },
}
