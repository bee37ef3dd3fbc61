//! Command line parsing.
//!
//! Each request line is parsed once into a tagged [`Command`]; the
//! handler then dispatches on the tag. This replaces order-dependent
//! prefix matching on raw strings: the price triple, for instance, is
//! only recognised when all three colon-delimited fields parse as
//! integers.

use super::errors::DispatchError;
use crate::registry::{OwnerId, VehicleId};

/// One parsed protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `register_Renter`
    RegisterRenter,
    /// `register_Owner`
    RegisterOwner,
    /// `owner_Id: <id>`
    OwnerId(OwnerId),
    /// `post_Car` — list available vehicles.
    PostCar,
    /// `request_Car` — prompt for a vehicle id.
    RequestCar,
    /// `car_Id: <id>` — reserve a vehicle.
    CarId(VehicleId),
    /// `start_Engine`
    StartEngine,
    /// `unlock_Car`
    UnlockCar,
    /// `lock_Car`
    LockCar,
    /// `pay_Rental`
    PayRental,
    /// `change_Price` — prompt for the price triple.
    ChangePrice,
    /// `<owner_id>:<car_id>:<new_price>`
    SetPrice {
        owner_id: OwnerId,
        car_id: VehicleId,
        price: u32,
    },
    /// `end_Rental`
    EndRental,
}

impl Command {
    /// Parses one trimmed request line.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownCommand`] when the line matches no
    /// recognised verb.
    pub fn parse(line: &str) -> Result<Self, DispatchError> {
        let line = line.trim();
        match line {
            "register_Renter" => return Ok(Self::RegisterRenter),
            "register_Owner" => return Ok(Self::RegisterOwner),
            "post_Car" => return Ok(Self::PostCar),
            "request_Car" => return Ok(Self::RequestCar),
            "start_Engine" => return Ok(Self::StartEngine),
            "unlock_Car" => return Ok(Self::UnlockCar),
            "lock_Car" => return Ok(Self::LockCar),
            "pay_Rental" => return Ok(Self::PayRental),
            "change_Price" => return Ok(Self::ChangePrice),
            "end_Rental" => return Ok(Self::EndRental),
            _ => {}
        }

        if let Some(argument) = keyed_argument(line, "owner_Id") {
            if let Ok(id) = argument.parse::<OwnerId>() {
                return Ok(Self::OwnerId(id));
            }
            return Err(DispatchError::unknown_command(line));
        }
        if let Some(argument) = keyed_argument(line, "car_Id") {
            if let Ok(id) = argument.parse::<VehicleId>() {
                return Ok(Self::CarId(id));
            }
            return Err(DispatchError::unknown_command(line));
        }
        if let Some(command) = parse_price_triple(line) {
            return Ok(command);
        }
        Err(DispatchError::unknown_command(line))
    }
}

/// Extracts the argument of a `key: value` line, if the key matches.
fn keyed_argument<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (head, tail) = line.split_once(':')?;
    (head.trim() == key).then(|| tail.trim())
}

/// Recognises the `<owner_id>:<car_id>:<new_price>` form.
fn parse_price_triple(line: &str) -> Option<Command> {
    let mut fields = line.splitn(3, ':');
    let owner_id = fields.next()?.trim().parse::<OwnerId>().ok()?;
    let car_id = fields.next()?.trim().parse::<VehicleId>().ok()?;
    let price = fields.next()?.trim().parse::<u32>().ok()?;
    Some(Command::SetPrice {
        owner_id,
        car_id,
        price,
    })
}
