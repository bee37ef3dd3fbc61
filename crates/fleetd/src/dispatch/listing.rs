//! Vehicle listing serialization.
//!
//! Listings are one JSON object per line carrying the display fields of
//! a vehicle. The optional `location` field comes from the injected
//! [`LocationProvider`] and is omitted when unknown.

use serde::Serialize;

use super::errors::DispatchError;
use crate::location::LocationProvider;
use crate::registry::{Vehicle, VehicleId};

/// Serialized view of one vehicle in a listing.
#[derive(Debug, Serialize)]
pub struct ListingEntry<'a> {
    id: VehicleId,
    brand: &'a str,
    model: &'a str,
    year: u16,
    price: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

impl<'a> ListingEntry<'a> {
    /// Builds the listing view of a vehicle snapshot.
    pub fn new(vehicle: &'a Vehicle, locations: &dyn LocationProvider) -> Self {
        Self {
            id: vehicle.id,
            brand: &vehicle.brand,
            model: &vehicle.model,
            year: vehicle.year,
            price: vehicle.price,
            location: locations.locate(vehicle.id),
        }
    }
}

/// Renders vehicles as newline-joined JSON listing lines.
pub fn render_listing(
    vehicles: &[Vehicle],
    locations: &dyn LocationProvider,
) -> Result<String, DispatchError> {
    let mut lines = Vec::with_capacity(vehicles.len());
    for vehicle in vehicles {
        lines.push(serde_json::to_string(&ListingEntry::new(vehicle, locations))?);
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{NullLocationProvider, StaticLocationProvider};

    fn vehicle() -> Vehicle {
        Vehicle::new(2, "BMW", "X5", 2020, 150, 12)
    }

    #[test]
    fn entry_serializes_display_fields() {
        let vehicle = vehicle();
        let line = render_listing(std::slice::from_ref(&vehicle), &NullLocationProvider)
            .expect("render");
        assert_eq!(
            line,
            r#"{"id":2,"brand":"BMW","model":"X5","year":2020,"price":150}"#
        );
    }

    #[test]
    fn entry_includes_known_location() {
        let provider: StaticLocationProvider =
            [(2, "45.75,21.22".to_string())].into_iter().collect();
        let vehicle = vehicle();
        let line =
            render_listing(std::slice::from_ref(&vehicle), &provider).expect("render");
        assert!(line.contains(r#""location":"45.75,21.22""#));
    }

    #[test]
    fn multiple_vehicles_render_one_line_each() {
        let vehicles = vec![vehicle(), Vehicle::new(3, "Mercedes", "E200", 2018, 120, 13)];
        let listing = render_listing(&vehicles, &NullLocationProvider).expect("render");
        assert_eq!(listing.lines().count(), 2);
    }

    #[test]
    fn empty_listing_renders_empty_string() {
        let listing = render_listing(&[], &NullLocationProvider).expect("render");
        assert!(listing.is_empty());
    }
}
