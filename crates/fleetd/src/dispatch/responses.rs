//! Canonical protocol response strings.

pub const REGISTERED_RENTER: &str = "You are registered as a renter.";
pub const ENTER_OWNER_ID: &str = "Enter the Owner Id like this: 'owner_Id: id'";
pub const OWNER_REGISTERED_PREFIX: &str = "You are registered as an owner. Your cars are: ";
pub const NO_CARS_FOUND: &str = "No cars found.";
pub const ENTER_CAR_ID: &str = "Enter the Id of requested car like this: 'car_Id: id'";
pub const RENTAL_STARTED: &str = "Rental started.";
pub const CAR_NOT_AVAILABLE: &str = "Car not found or not available.";
pub const ENGINE_STARTED: &str = "Engine started.";
pub const CAR_UNLOCKED: &str = "Car unlocked.";
pub const CAR_LOCKED: &str = "Car locked.";
pub const RENTAL_PAID: &str = "Rental paid.";
pub const ENTER_NEW_PRICE: &str =
    "Enter the Id of the car and the new price like this: 'owner_Id: car_Id: new_price'";
pub const PRICE_CHANGED: &str = "Price changed.";
pub const CAR_NOT_FOUND: &str = "Car not found.";
pub const RENTAL_ENDED: &str = "Rental ended.";
pub const INVALID_COMMAND: &str = "Invalid command.";
pub const REGISTER_FIRST: &str = "You have to register first.";
pub const PAY_FIRST: &str = "You have to pay the rental first.";
pub const NO_ACTIVE_RENTAL: &str = "You have no active rental.";
pub const ALREADY_REGISTERED: &str = "You are already registered.";
pub const ALREADY_RENTING: &str = "You already have an active rental.";
