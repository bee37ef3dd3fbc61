use fleet_config::VehicleSeed;

use crate::session::SessionId;

/// Stable vehicle identifier, fixed at startup.
pub type VehicleId = u32;

/// Identity of the party owning a vehicle.
pub type OwnerId = u32;

/// Whether a vehicle can currently be reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Availability {
    #[default]
    Available,
    Reserved,
}

/// Door lock actuator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

/// Engine actuator state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineState {
    #[default]
    Off,
    On,
}

/// Payment state of the active rental.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentState {
    #[default]
    Unpaid,
    Paid,
}

/// One vehicle record.
///
/// The registry hands these out by value only; callers never receive a
/// mutable reference into the shared table. `availability` is `Reserved`
/// exactly when `current_renter` is set, and the actuator and payment
/// fields are reset to their defaults whenever the vehicle returns to
/// `Available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub brand: String,
    pub model: String,
    pub year: u16,
    pub price: u32,
    pub owner_id: OwnerId,
    pub availability: Availability,
    pub current_renter: Option<SessionId>,
    pub lock_state: LockState,
    pub engine_state: EngineState,
    pub payment_state: PaymentState,
}

impl Vehicle {
    /// Creates an available vehicle with default actuator state.
    #[must_use]
    pub fn new(
        id: VehicleId,
        brand: impl Into<String>,
        model: impl Into<String>,
        year: u16,
        price: u32,
        owner_id: OwnerId,
    ) -> Self {
        Self {
            id,
            brand: brand.into(),
            model: model.into(),
            year,
            price,
            owner_id,
            availability: Availability::default(),
            current_renter: None,
            lock_state: LockState::default(),
            engine_state: EngineState::default(),
            payment_state: PaymentState::default(),
        }
    }

    /// Whether the vehicle can be reserved right now.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    /// Returns the vehicle to `Available` with default rental state.
    pub(crate) fn reset_rental_state(&mut self) {
        self.availability = Availability::Available;
        self.current_renter = None;
        self.lock_state = LockState::default();
        self.engine_state = EngineState::default();
        self.payment_state = PaymentState::default();
    }
}

impl From<&VehicleSeed> for Vehicle {
    fn from(seed: &VehicleSeed) -> Self {
        Self::new(
            seed.id,
            seed.brand.clone(),
            seed.model.clone(),
            seed.year,
            seed.price,
            seed.owner_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_vehicles_are_available_with_default_state() {
        let vehicle = Vehicle::new(1, "Audi", "A4", 2019, 100, 11);
        assert!(vehicle.is_available());
        assert_eq!(vehicle.current_renter, None);
        assert_eq!(vehicle.lock_state, LockState::Locked);
        assert_eq!(vehicle.engine_state, EngineState::Off);
        assert_eq!(vehicle.payment_state, PaymentState::Unpaid);
    }

    #[test]
    fn reset_clears_rental_state() {
        let mut vehicle = Vehicle::new(1, "Audi", "A4", 2019, 100, 11);
        vehicle.availability = Availability::Reserved;
        vehicle.current_renter = Some(7);
        vehicle.lock_state = LockState::Unlocked;
        vehicle.engine_state = EngineState::On;
        vehicle.payment_state = PaymentState::Paid;

        vehicle.reset_rental_state();

        assert!(vehicle.is_available());
        assert_eq!(vehicle.current_renter, None);
        assert_eq!(vehicle.lock_state, LockState::Locked);
        assert_eq!(vehicle.engine_state, EngineState::Off);
        assert_eq!(vehicle.payment_state, PaymentState::Unpaid);
    }
}
