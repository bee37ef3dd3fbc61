//! Authoritative in-memory vehicle registry.
//!
//! The registry is the sole owner of vehicle records. Every operation
//! acquires the table lock for its whole check-and-mutate sequence, so
//! mutations on a given vehicle are linearizable: two sessions racing to
//! reserve the same vehicle resolve with exactly one winner. Queries
//! return snapshots by value; no mutable reference into the table ever
//! escapes.

mod errors;
mod vehicle;

pub use self::errors::RegistryError;
pub use self::vehicle::{
    Availability, EngineState, LockState, OwnerId, PaymentState, Vehicle, VehicleId,
};

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use fleet_config::FleetSeed;

use crate::session::SessionId;

type VehicleTable = BTreeMap<VehicleId, Vehicle>;

/// Shared, lock-guarded collection of vehicle records.
#[derive(Debug, Default)]
pub struct VehicleRegistry {
    vehicles: RwLock<VehicleTable>,
}

impl VehicleRegistry {
    /// Builds a registry from vehicle records.
    #[must_use]
    pub fn new(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let table = vehicles
            .into_iter()
            .map(|vehicle| (vehicle.id, vehicle))
            .collect();
        Self {
            vehicles: RwLock::new(table),
        }
    }

    /// Builds a registry from a validated fleet seed.
    #[must_use]
    pub fn from_seed(seed: &FleetSeed) -> Self {
        Self::new(seed.vehicles().iter().map(Vehicle::from))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, VehicleTable>, RegistryError> {
        self.vehicles.read().map_err(|_| RegistryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, VehicleTable>, RegistryError> {
        self.vehicles.write().map_err(|_| RegistryError::Poisoned)
    }

    /// Number of vehicles in the registry.
    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.len())
    }

    /// Whether the registry holds no vehicles.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        Ok(self.read()?.is_empty())
    }

    /// Point-in-time snapshot of every available vehicle, ordered by id.
    pub fn list_available(&self) -> Result<Vec<Vehicle>, RegistryError> {
        Ok(self
            .read()?
            .values()
            .filter(|vehicle| vehicle.is_available())
            .cloned()
            .collect())
    }

    /// Snapshot of one vehicle.
    pub fn find(&self, id: VehicleId) -> Result<Vehicle, RegistryError> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound { id })
    }

    /// Snapshot of every vehicle owned by the given party, ordered by id.
    pub fn cars_of(&self, owner_id: OwnerId) -> Result<Vec<Vehicle>, RegistryError> {
        Ok(self
            .read()?
            .values()
            .filter(|vehicle| vehicle.owner_id == owner_id)
            .cloned()
            .collect())
    }

    /// The vehicle currently reserved by the session, if any.
    pub fn vehicle_held_by(&self, session: SessionId) -> Result<Option<VehicleId>, RegistryError> {
        Ok(self
            .read()?
            .values()
            .find(|vehicle| vehicle.current_renter == Some(session))
            .map(|vehicle| vehicle.id))
    }

    /// Atomically reserves an available vehicle for the session.
    ///
    /// The availability check and the mutation happen under one write
    /// lock, so concurrent calls against the same id see a single total
    /// order and at most one succeeds. A session holding a reservation
    /// cannot acquire a second one.
    pub fn reserve(&self, id: VehicleId, session: SessionId) -> Result<(), RegistryError> {
        let mut table = self.write()?;
        if table
            .values()
            .any(|vehicle| vehicle.current_renter == Some(session))
        {
            return Err(RegistryError::AlreadyRenting { session });
        }
        let vehicle = table.get_mut(&id).ok_or(RegistryError::NotFound { id })?;
        if !vehicle.is_available() {
            return Err(RegistryError::AlreadyReserved { id });
        }
        vehicle.availability = Availability::Reserved;
        vehicle.current_renter = Some(session);
        Ok(())
    }

    /// Returns a vehicle to `Available` and resets its rental state.
    pub fn release(&self, id: VehicleId) -> Result<(), RegistryError> {
        let mut table = self.write()?;
        let vehicle = table.get_mut(&id).ok_or(RegistryError::NotFound { id })?;
        vehicle.reset_rental_state();
        Ok(())
    }

    /// Releases every vehicle held by the session and reports their ids.
    ///
    /// Used for disconnect cleanup, so a dropped connection never leaves
    /// a vehicle permanently reserved.
    pub fn release_all_for(&self, session: SessionId) -> Result<Vec<VehicleId>, RegistryError> {
        let mut table = self.write()?;
        let mut released = Vec::new();
        for vehicle in table.values_mut() {
            if vehicle.current_renter == Some(session) {
                vehicle.reset_rental_state();
                released.push(vehicle.id);
            }
        }
        Ok(released)
    }

    /// Changes a vehicle's price on behalf of its owner.
    pub fn set_price(
        &self,
        id: VehicleId,
        requester: OwnerId,
        new_price: u32,
    ) -> Result<(), RegistryError> {
        let mut table = self.write()?;
        let vehicle = table.get_mut(&id).ok_or(RegistryError::NotFound { id })?;
        if vehicle.owner_id != requester {
            return Err(RegistryError::Forbidden { id });
        }
        vehicle.price = new_price;
        Ok(())
    }

    /// Marks the session's rental of the vehicle as paid.
    pub fn mark_paid(&self, id: VehicleId, session: SessionId) -> Result<(), RegistryError> {
        self.with_rented_vehicle(id, session, |vehicle| {
            vehicle.payment_state = PaymentState::Paid;
        })
    }

    /// Sets the lock actuator. Repeating the current state is a no-op.
    pub fn set_lock(
        &self,
        id: VehicleId,
        session: SessionId,
        locked: bool,
    ) -> Result<(), RegistryError> {
        self.with_rented_vehicle(id, session, |vehicle| {
            vehicle.lock_state = if locked {
                LockState::Locked
            } else {
                LockState::Unlocked
            };
        })
    }

    /// Starts the engine. Repeating is a no-op.
    pub fn start_engine(&self, id: VehicleId, session: SessionId) -> Result<(), RegistryError> {
        self.with_rented_vehicle(id, session, |vehicle| {
            vehicle.engine_state = EngineState::On;
        })
    }

    /// Confirms payment and ends the rental, releasing the vehicle.
    pub fn confirm_and_end(&self, id: VehicleId, session: SessionId) -> Result<(), RegistryError> {
        let mut table = self.write()?;
        let vehicle = table.get_mut(&id).ok_or(RegistryError::NotFound { id })?;
        if vehicle.current_renter != Some(session) {
            return Err(RegistryError::Forbidden { id });
        }
        if vehicle.payment_state != PaymentState::Paid {
            return Err(RegistryError::NotPaid { id });
        }
        vehicle.reset_rental_state();
        Ok(())
    }

    fn with_rented_vehicle(
        &self,
        id: VehicleId,
        session: SessionId,
        mutate: impl FnOnce(&mut Vehicle),
    ) -> Result<(), RegistryError> {
        let mut table = self.write()?;
        let vehicle = table.get_mut(&id).ok_or(RegistryError::NotFound { id })?;
        if vehicle.current_renter != Some(session) {
            return Err(RegistryError::Forbidden { id });
        }
        mutate(vehicle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn registry() -> VehicleRegistry {
        VehicleRegistry::from_seed(&FleetSeed::builtin())
    }

    fn assert_reservation_invariant(registry: &VehicleRegistry, id: VehicleId) {
        let vehicle = registry.find(id).expect("vehicle exists");
        assert_eq!(
            vehicle.availability == Availability::Reserved,
            vehicle.current_renter.is_some(),
            "availability must mirror current_renter for vehicle {id}"
        );
    }

    #[rstest]
    fn seeds_builtin_fleet(registry: VehicleRegistry) {
        assert_eq!(registry.len().expect("len"), 3);
        let available = registry.list_available().expect("list");
        assert_eq!(available.len(), 3);
        // BTreeMap keeps listings ordered by id.
        assert_eq!(
            available.iter().map(|v| v.id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[rstest]
    fn reserve_marks_vehicle_and_renter(registry: VehicleRegistry) {
        registry.reserve(2, 40).expect("reserve");
        let vehicle = registry.find(2).expect("find");
        assert_eq!(vehicle.availability, Availability::Reserved);
        assert_eq!(vehicle.current_renter, Some(40));
        assert_reservation_invariant(&registry, 2);

        let available = registry.list_available().expect("list");
        assert!(available.iter().all(|v| v.id != 2));
    }

    #[rstest]
    fn reserve_rejects_taken_vehicle(registry: VehicleRegistry) {
        registry.reserve(2, 40).expect("reserve");
        assert_eq!(
            registry.reserve(2, 41),
            Err(RegistryError::AlreadyReserved { id: 2 })
        );
        assert_eq!(registry.find(2).expect("find").current_renter, Some(40));
    }

    #[rstest]
    fn reserve_rejects_second_reservation_per_session(registry: VehicleRegistry) {
        registry.reserve(1, 40).expect("reserve first");
        assert_eq!(
            registry.reserve(2, 40),
            Err(RegistryError::AlreadyRenting { session: 40 })
        );
        assert!(registry.find(2).expect("find").is_available());
    }

    #[rstest]
    fn reserve_rejects_unknown_vehicle(registry: VehicleRegistry) {
        assert_eq!(
            registry.reserve(99, 40),
            Err(RegistryError::NotFound { id: 99 })
        );
    }

    #[rstest]
    fn release_restores_defaults(registry: VehicleRegistry) {
        registry.reserve(3, 40).expect("reserve");
        registry.set_lock(3, 40, false).expect("unlock");
        registry.start_engine(3, 40).expect("start engine");
        registry.mark_paid(3, 40).expect("pay");

        registry.release(3).expect("release");

        let vehicle = registry.find(3).expect("find");
        assert!(vehicle.is_available());
        assert_eq!(vehicle.current_renter, None);
        assert_eq!(vehicle.lock_state, LockState::Locked);
        assert_eq!(vehicle.engine_state, EngineState::Off);
        assert_eq!(vehicle.payment_state, PaymentState::Unpaid);
        assert_reservation_invariant(&registry, 3);
    }

    #[rstest]
    fn release_all_for_clears_session_reservations(registry: VehicleRegistry) {
        registry.reserve(1, 40).expect("reserve");
        registry.reserve(2, 41).expect("other session reserves");

        let released = registry.release_all_for(40).expect("release all");
        assert_eq!(released, vec![1]);
        assert!(registry.find(1).expect("find").is_available());
        // Other sessions keep their reservations.
        assert_eq!(registry.find(2).expect("find").current_renter, Some(41));
    }

    #[rstest]
    fn set_price_requires_matching_owner(registry: VehicleRegistry) {
        assert_eq!(
            registry.set_price(1, 10, 500),
            Err(RegistryError::Forbidden { id: 1 })
        );
        assert_eq!(registry.find(1).expect("find").price, 100);

        registry.set_price(1, 11, 500).expect("owner sets price");
        assert_eq!(registry.find(1).expect("find").price, 500);
    }

    #[rstest]
    fn actuators_require_current_renter(registry: VehicleRegistry) {
        registry.reserve(1, 40).expect("reserve");
        assert_eq!(
            registry.start_engine(1, 41),
            Err(RegistryError::Forbidden { id: 1 })
        );
        assert_eq!(
            registry.set_lock(1, 41, false),
            Err(RegistryError::Forbidden { id: 1 })
        );
        assert_eq!(
            registry.mark_paid(1, 41),
            Err(RegistryError::Forbidden { id: 1 })
        );
    }

    #[rstest]
    fn lock_operations_are_idempotent(registry: VehicleRegistry) {
        registry.reserve(1, 40).expect("reserve");
        registry.set_lock(1, 40, false).expect("unlock");
        registry.set_lock(1, 40, false).expect("unlock again");
        assert_eq!(
            registry.find(1).expect("find").lock_state,
            LockState::Unlocked
        );
        registry.set_lock(1, 40, true).expect("lock");
        registry.set_lock(1, 40, true).expect("lock again");
        assert_eq!(registry.find(1).expect("find").lock_state, LockState::Locked);
    }

    #[rstest]
    fn confirm_and_end_requires_payment(registry: VehicleRegistry) {
        registry.reserve(2, 40).expect("reserve");
        assert_eq!(
            registry.confirm_and_end(2, 40),
            Err(RegistryError::NotPaid { id: 2 })
        );
        // Failed termination leaves the reservation untouched.
        assert_eq!(registry.find(2).expect("find").current_renter, Some(40));

        registry.mark_paid(2, 40).expect("pay");
        registry.confirm_and_end(2, 40).expect("end rental");
        assert!(registry.find(2).expect("find").is_available());
        assert_reservation_invariant(&registry, 2);
    }

    #[rstest]
    fn confirm_and_end_requires_renter(registry: VehicleRegistry) {
        registry.reserve(2, 40).expect("reserve");
        registry.mark_paid(2, 40).expect("pay");
        assert_eq!(
            registry.confirm_and_end(2, 41),
            Err(RegistryError::Forbidden { id: 2 })
        );
    }

    #[rstest]
    fn cars_of_filters_by_owner(registry: VehicleRegistry) {
        let cars = registry.cars_of(11).expect("cars of 11");
        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].brand, "Audi");
        assert!(registry.cars_of(99).expect("cars of 99").is_empty());
    }

    #[rstest]
    fn vehicle_held_by_finds_reservation(registry: VehicleRegistry) {
        assert_eq!(registry.vehicle_held_by(40).expect("held"), None);
        registry.reserve(3, 40).expect("reserve");
        assert_eq!(registry.vehicle_held_by(40).expect("held"), Some(3));
    }

    #[test]
    fn concurrent_reserve_has_single_winner() {
        use std::sync::Arc;
        use std::sync::Barrier;
        use std::thread;

        let registry = Arc::new(VehicleRegistry::from_seed(&FleetSeed::builtin()));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|index| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    registry.reserve(2, 100 + index)
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().expect("join"))
            .filter(Result::is_ok)
            .count();
        assert_eq!(winners, 1, "exactly one session may win the reservation");

        let vehicle = registry.find(2).expect("find");
        assert_eq!(vehicle.availability, Availability::Reserved);
        assert!(vehicle.current_renter.is_some());
    }
}
