//! Per-connection command dispatch.
//!
//! The handler owns the whole connection lifecycle: allocate a session,
//! loop reading command lines, execute each against the registry and
//! session manager, write the framed response, and clean up on exit.
//! Authorization and state failures become canonical response strings
//! and keep the connection open; IO failures end the connection. Either
//! way, disconnect cleanup releases every vehicle the session still
//! holds, so an abruptly dropped client never strands a reservation.

use std::io::{BufRead, BufReader, Read};
use std::net::TcpStream;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::location::LocationProvider;
use crate::registry::{RegistryError, VehicleId, VehicleRegistry};
use crate::session::{Role, SessionId, SessionManager};
use crate::transport::ConnectionHandler;

use super::command::Command;
use super::errors::DispatchError;
use super::listing::render_listing;
use super::reply::ResponseWriter;
use super::responses;

pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Maximum size of one command line in bytes.
const MAX_LINE_BYTES: usize = 1024;

/// Result of executing one command.
#[derive(Debug, PartialEq, Eq)]
pub struct Outcome {
    /// Response payload to send.
    pub reply: String,
    /// Whether the connection closes after this response.
    pub close: bool,
}

impl Outcome {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            close: false,
        }
    }

    fn close(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            close: true,
        }
    }
}

/// Connection handler that serves the rental protocol.
///
/// Holds no per-connection state of its own; one instance is shared by
/// every connection thread and all mutable state lives in the registry
/// and the session manager.
pub struct SessionConnectionHandler {
    registry: Arc<VehicleRegistry>,
    sessions: Arc<SessionManager>,
    locations: Arc<dyn LocationProvider>,
}

impl SessionConnectionHandler {
    /// Creates a handler over the shared registry and session manager.
    pub fn new(
        registry: Arc<VehicleRegistry>,
        sessions: Arc<SessionManager>,
        locations: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            registry,
            sessions,
            locations,
        }
    }

    fn serve(&self, stream: TcpStream) -> Result<(), DispatchError> {
        let session = self.sessions.create_session()?;
        debug!(target: DISPATCH_TARGET, session, "session opened");

        let result = self.session_loop(session, stream);
        self.cleanup(session);
        debug!(target: DISPATCH_TARGET, session, "session closed");
        result
    }

    fn session_loop(&self, session: SessionId, stream: TcpStream) -> Result<(), DispatchError> {
        let mut writer = ResponseWriter::new(stream.try_clone()?);
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        loop {
            if read_command_line(&mut reader, &mut line)?.is_none() {
                return Ok(());
            }
            let outcome = self.execute(session, line.trim())?;
            writer.write_response(&outcome.reply)?;
            if outcome.close {
                return Ok(());
            }
        }
    }

    /// Releases held vehicles and destroys the session record.
    ///
    /// Runs on every exit path; errors here are logged rather than
    /// propagated so cleanup failures never mask the loop's own result.
    fn cleanup(&self, session: SessionId) {
        match self.registry.release_all_for(session) {
            Ok(released) => {
                for vehicle in released {
                    info!(
                        target: DISPATCH_TARGET,
                        session, vehicle, "released vehicle on disconnect"
                    );
                }
            }
            Err(error) => {
                warn!(target: DISPATCH_TARGET, session, %error, "disconnect cleanup failed");
            }
        }
        if let Err(error) = self.sessions.destroy_session(session) {
            warn!(target: DISPATCH_TARGET, session, %error, "failed to destroy session");
        }
    }

    /// Executes one command line and produces its response.
    pub fn execute(&self, session: SessionId, input: &str) -> Result<Outcome, DispatchError> {
        let role = self.sessions.get_role(session)?;
        let command = match Command::parse(input) {
            Ok(command) => command,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, session, %error, "unrecognised input");
                return Ok(Outcome::reply(unknown_input_reply(role)));
            }
        };
        debug!(target: DISPATCH_TARGET, session, ?command, "dispatching command");

        match command {
            Command::RegisterRenter => self.register_renter(session, role),
            Command::RegisterOwner => self.register_owner(session, role),
            Command::OwnerId(owner_id) => self.register_owner_id(session, role, owner_id),
            Command::PostCar => self.list_available(role),
            Command::RequestCar => Ok(registered_reply(role, responses::ENTER_CAR_ID)),
            Command::CarId(car_id) => self.reserve(session, role, car_id),
            Command::StartEngine => self.with_held_vehicle(session, role, |id| {
                self.registry.start_engine(id, session)?;
                Ok(responses::ENGINE_STARTED)
            }),
            Command::UnlockCar => self.with_held_vehicle(session, role, |id| {
                self.registry.set_lock(id, session, false)?;
                Ok(responses::CAR_UNLOCKED)
            }),
            Command::LockCar => self.with_held_vehicle(session, role, |id| {
                self.registry.set_lock(id, session, true)?;
                Ok(responses::CAR_LOCKED)
            }),
            Command::PayRental => self.with_held_vehicle(session, role, |id| {
                self.registry.mark_paid(id, session)?;
                Ok(responses::RENTAL_PAID)
            }),
            Command::ChangePrice => Ok(owner_reply(role, responses::ENTER_NEW_PRICE)),
            Command::SetPrice {
                owner_id,
                car_id,
                price,
            } => self.set_price(session, role, owner_id, car_id, price),
            Command::EndRental => self.end_rental(session, role),
        }
    }

    fn register_renter(&self, session: SessionId, role: Role) -> Result<Outcome, DispatchError> {
        match role {
            Role::Unregistered => {
                self.sessions.set_role(session, Role::Renter)?;
                Ok(Outcome::reply(responses::REGISTERED_RENTER))
            }
            Role::PendingOwnerId => Ok(Outcome::reply(responses::INVALID_COMMAND)),
            Role::Renter | Role::Owner(_) => Ok(Outcome::reply(responses::ALREADY_REGISTERED)),
        }
    }

    fn register_owner(&self, session: SessionId, role: Role) -> Result<Outcome, DispatchError> {
        match role {
            // Re-issuing register_Owner before the owner_Id follow-up just
            // repeats the prompt.
            Role::Unregistered | Role::PendingOwnerId => {
                self.sessions.set_role(session, Role::PendingOwnerId)?;
                Ok(Outcome::reply(responses::ENTER_OWNER_ID))
            }
            Role::Renter | Role::Owner(_) => Ok(Outcome::reply(responses::ALREADY_REGISTERED)),
        }
    }

    fn register_owner_id(
        &self,
        session: SessionId,
        role: Role,
        owner_id: u32,
    ) -> Result<Outcome, DispatchError> {
        match role {
            Role::PendingOwnerId => {
                let cars = self.registry.cars_of(owner_id)?;
                if cars.is_empty() {
                    // Stay pending so the client may retry with another id.
                    return Ok(Outcome::reply(responses::NO_CARS_FOUND));
                }
                self.sessions.set_role(session, Role::Owner(owner_id))?;
                let listing = render_listing(&cars, self.locations.as_ref())?;
                Ok(Outcome::reply(format!(
                    "{}\n{listing}",
                    responses::OWNER_REGISTERED_PREFIX
                )))
            }
            Role::Unregistered => Ok(Outcome::reply(responses::REGISTER_FIRST)),
            Role::Renter | Role::Owner(_) => Ok(Outcome::reply(responses::INVALID_COMMAND)),
        }
    }

    fn list_available(&self, role: Role) -> Result<Outcome, DispatchError> {
        if !role.is_registered() {
            return Ok(Outcome::reply(responses::REGISTER_FIRST));
        }
        let available = self.registry.list_available()?;
        let listing = render_listing(&available, self.locations.as_ref())?;
        Ok(Outcome::reply(listing))
    }

    fn reserve(
        &self,
        session: SessionId,
        role: Role,
        car_id: VehicleId,
    ) -> Result<Outcome, DispatchError> {
        if !role.is_registered() {
            return Ok(Outcome::reply(responses::REGISTER_FIRST));
        }
        match self.registry.reserve(car_id, session) {
            Ok(()) => Ok(Outcome::reply(responses::RENTAL_STARTED)),
            Err(RegistryError::NotFound { .. } | RegistryError::AlreadyReserved { .. }) => {
                Ok(Outcome::reply(responses::CAR_NOT_AVAILABLE))
            }
            Err(RegistryError::AlreadyRenting { .. }) => {
                Ok(Outcome::reply(responses::ALREADY_RENTING))
            }
            Err(error) => Err(error.into()),
        }
    }

    fn with_held_vehicle(
        &self,
        session: SessionId,
        role: Role,
        operation: impl FnOnce(VehicleId) -> Result<&'static str, RegistryError>,
    ) -> Result<Outcome, DispatchError> {
        if !role.is_registered() {
            return Ok(Outcome::reply(responses::REGISTER_FIRST));
        }
        match self.registry.vehicle_held_by(session)? {
            None => Ok(Outcome::reply(responses::NO_ACTIVE_RENTAL)),
            Some(id) => Ok(Outcome::reply(operation(id)?)),
        }
    }

    fn set_price(
        &self,
        session: SessionId,
        role: Role,
        owner_id: u32,
        car_id: VehicleId,
        price: u32,
    ) -> Result<Outcome, DispatchError> {
        let Some(session_owner) = role.owner_id() else {
            return Ok(Outcome::reply(owner_denied_reply(role)));
        };
        if owner_id != session_owner {
            debug!(
                target: DISPATCH_TARGET,
                session, owner_id, session_owner, "price change owner mismatch"
            );
            return Ok(Outcome::reply(responses::CAR_NOT_FOUND));
        }
        // The registry re-checks ownership against the vehicle record.
        match self.registry.set_price(car_id, owner_id, price) {
            Ok(()) => Ok(Outcome::reply(responses::PRICE_CHANGED)),
            Err(RegistryError::NotFound { .. } | RegistryError::Forbidden { .. }) => {
                Ok(Outcome::reply(responses::CAR_NOT_FOUND))
            }
            Err(error) => Err(error.into()),
        }
    }

    fn end_rental(&self, session: SessionId, role: Role) -> Result<Outcome, DispatchError> {
        if !role.is_registered() {
            return Ok(Outcome::reply(responses::REGISTER_FIRST));
        }
        let Some(id) = self.registry.vehicle_held_by(session)? else {
            return Ok(Outcome::reply(responses::NO_ACTIVE_RENTAL));
        };
        match self.registry.confirm_and_end(id, session) {
            Ok(()) => {
                info!(target: DISPATCH_TARGET, session, vehicle = id, "rental ended");
                Ok(Outcome::close(responses::RENTAL_ENDED))
            }
            Err(RegistryError::NotPaid { .. }) => Ok(Outcome::reply(responses::PAY_FIRST)),
            Err(RegistryError::Forbidden { .. }) => Ok(Outcome::reply(responses::NO_ACTIVE_RENTAL)),
            Err(error) => Err(error.into()),
        }
    }
}

impl ConnectionHandler for SessionConnectionHandler {
    fn handle(&self, stream: TcpStream) {
        if let Err(error) = self.serve(stream) {
            warn!(target: DISPATCH_TARGET, %error, "connection ended with error");
        }
    }
}

/// Reply for commands that only require a completed registration.
fn registered_reply(role: Role, text: &'static str) -> Outcome {
    if role.is_registered() {
        Outcome::reply(text)
    } else {
        Outcome::reply(responses::REGISTER_FIRST)
    }
}

/// Reply for commands restricted to owners.
fn owner_reply(role: Role, text: &'static str) -> Outcome {
    match role {
        Role::Owner(_) => Outcome::reply(text),
        _ => Outcome::reply(owner_denied_reply(role)),
    }
}

fn owner_denied_reply(role: Role) -> &'static str {
    if role.is_registered() {
        responses::INVALID_COMMAND
    } else {
        responses::REGISTER_FIRST
    }
}

fn unknown_input_reply(role: Role) -> &'static str {
    if role.is_registered() {
        responses::INVALID_COMMAND
    } else {
        responses::REGISTER_FIRST
    }
}

/// Reads one bounded command line, returning `None` at end of stream.
fn read_command_line<R: BufRead>(
    reader: &mut R,
    line: &mut String,
) -> Result<Option<()>, DispatchError> {
    line.clear();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES as u64 + 1)
        .read_line(line)?;
    if read == 0 {
        return Ok(None);
    }
    if read > MAX_LINE_BYTES && !line.ends_with('\n') {
        return Err(DispatchError::line_too_long(read, MAX_LINE_BYTES));
    }
    Ok(Some(()))
}

#[cfg(test)]
mod tests {
    use fleet_config::FleetSeed;
    use rstest::{fixture, rstest};

    use crate::location::NullLocationProvider;

    use super::*;

    struct Harness {
        handler: SessionConnectionHandler,
        sessions: Arc<SessionManager>,
        registry: Arc<VehicleRegistry>,
    }

    impl Harness {
        fn session(&self) -> SessionId {
            self.sessions.create_session().expect("create session")
        }

        fn reply(&self, session: SessionId, input: &str) -> String {
            self.handler
                .execute(session, input)
                .expect("execute command")
                .reply
        }

        fn renter(&self) -> SessionId {
            let session = self.session();
            assert_eq!(
                self.reply(session, "register_Renter"),
                responses::REGISTERED_RENTER
            );
            session
        }

        fn owner(&self, owner_id: u32) -> SessionId {
            let session = self.session();
            self.reply(session, "register_Owner");
            let reply = self.reply(session, &format!("owner_Id: {owner_id}"));
            assert!(reply.starts_with(responses::OWNER_REGISTERED_PREFIX));
            session
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let registry = Arc::new(VehicleRegistry::from_seed(&FleetSeed::builtin()));
        let sessions = Arc::new(SessionManager::new());
        let handler = SessionConnectionHandler::new(
            Arc::clone(&registry),
            Arc::clone(&sessions),
            Arc::new(NullLocationProvider),
        );
        Harness {
            handler,
            sessions,
            registry,
        }
    }

    #[rstest]
    fn unregistered_sessions_must_register(harness: Harness) {
        let session = harness.session();
        assert_eq!(harness.reply(session, "post_Car"), responses::REGISTER_FIRST);
        assert_eq!(harness.reply(session, "car_Id: 1"), responses::REGISTER_FIRST);
        assert_eq!(harness.reply(session, "gibberish"), responses::REGISTER_FIRST);
    }

    #[rstest]
    fn registered_sessions_get_invalid_command(harness: Harness) {
        let session = harness.renter();
        assert_eq!(harness.reply(session, "gibberish"), responses::INVALID_COMMAND);
        assert_eq!(harness.reply(session, ""), responses::INVALID_COMMAND);
    }

    #[rstest]
    fn renter_registration_is_terminal(harness: Harness) {
        let session = harness.renter();
        assert_eq!(
            harness.reply(session, "register_Renter"),
            responses::ALREADY_REGISTERED
        );
        assert_eq!(
            harness.reply(session, "register_Owner"),
            responses::ALREADY_REGISTERED
        );
    }

    #[rstest]
    fn owner_registration_flow(harness: Harness) {
        let session = harness.session();
        assert_eq!(
            harness.reply(session, "register_Owner"),
            responses::ENTER_OWNER_ID
        );
        let reply = harness.reply(session, "owner_Id: 11");
        assert!(reply.starts_with(responses::OWNER_REGISTERED_PREFIX));
        assert!(reply.contains("Audi"));
        assert_eq!(
            harness.sessions.get_role(session).expect("role"),
            Role::Owner(11)
        );
    }

    #[rstest]
    fn owner_id_without_cars_stays_pending(harness: Harness) {
        let session = harness.session();
        harness.reply(session, "register_Owner");
        assert_eq!(harness.reply(session, "owner_Id: 99"), responses::NO_CARS_FOUND);
        assert_eq!(
            harness.sessions.get_role(session).expect("role"),
            Role::PendingOwnerId
        );
        // Retrying with a valid id still works.
        let reply = harness.reply(session, "owner_Id: 12");
        assert!(reply.starts_with(responses::OWNER_REGISTERED_PREFIX));
    }

    #[rstest]
    fn post_car_lists_only_available_vehicles(harness: Harness) {
        let session = harness.renter();
        let listing = harness.reply(session, "post_Car");
        assert_eq!(listing.lines().count(), 3);

        assert_eq!(harness.reply(session, "car_Id: 2"), responses::RENTAL_STARTED);
        let listing = harness.reply(session, "post_Car");
        assert_eq!(listing.lines().count(), 2);
        assert!(!listing.contains("BMW"));
    }

    #[rstest]
    fn reservation_conflict_reports_unavailable(harness: Harness) {
        let first = harness.renter();
        let second = harness.renter();
        assert_eq!(harness.reply(first, "car_Id: 2"), responses::RENTAL_STARTED);
        assert_eq!(
            harness.reply(second, "car_Id: 2"),
            responses::CAR_NOT_AVAILABLE
        );
        assert_eq!(
            harness.reply(second, "car_Id: 99"),
            responses::CAR_NOT_AVAILABLE
        );
    }

    #[rstest]
    fn one_reservation_per_session(harness: Harness) {
        let session = harness.renter();
        harness.reply(session, "car_Id: 1");
        assert_eq!(harness.reply(session, "car_Id: 2"), responses::ALREADY_RENTING);
    }

    #[rstest]
    fn actuators_require_reservation(harness: Harness) {
        let session = harness.renter();
        assert_eq!(
            harness.reply(session, "start_Engine"),
            responses::NO_ACTIVE_RENTAL
        );
        assert_eq!(
            harness.reply(session, "unlock_Car"),
            responses::NO_ACTIVE_RENTAL
        );
        assert_eq!(
            harness.reply(session, "pay_Rental"),
            responses::NO_ACTIVE_RENTAL
        );
    }

    #[rstest]
    fn actuator_commands_are_idempotent(harness: Harness) {
        let session = harness.renter();
        harness.reply(session, "car_Id: 1");
        assert_eq!(harness.reply(session, "unlock_Car"), responses::CAR_UNLOCKED);
        assert_eq!(harness.reply(session, "unlock_Car"), responses::CAR_UNLOCKED);
        assert_eq!(harness.reply(session, "lock_Car"), responses::CAR_LOCKED);
        assert_eq!(harness.reply(session, "lock_Car"), responses::CAR_LOCKED);
        assert_eq!(harness.reply(session, "start_Engine"), responses::ENGINE_STARTED);
    }

    #[rstest]
    fn end_rental_requires_payment(harness: Harness) {
        let session = harness.renter();
        harness.reply(session, "car_Id: 2");
        assert_eq!(harness.reply(session, "end_Rental"), responses::PAY_FIRST);
        // The reservation survives a failed termination.
        assert_eq!(
            harness.registry.find(2).expect("find").current_renter,
            Some(session)
        );

        assert_eq!(harness.reply(session, "pay_Rental"), responses::RENTAL_PAID);
        let outcome = harness
            .handler
            .execute(session, "end_Rental")
            .expect("execute");
        assert_eq!(outcome.reply, responses::RENTAL_ENDED);
        assert!(outcome.close, "end_Rental must close the connection");
        assert!(harness.registry.find(2).expect("find").is_available());
    }

    #[rstest]
    fn price_change_requires_matching_owner(harness: Harness) {
        let session = harness.owner(11);
        assert_eq!(
            harness.reply(session, "change_Price"),
            responses::ENTER_NEW_PRICE
        );
        assert_eq!(harness.reply(session, "10:1:500"), responses::CAR_NOT_FOUND);
        assert_eq!(harness.registry.find(1).expect("find").price, 100);

        assert_eq!(harness.reply(session, "11:1:500"), responses::PRICE_CHANGED);
        assert_eq!(harness.registry.find(1).expect("find").price, 500);
    }

    #[rstest]
    fn price_change_rejects_unknown_vehicle(harness: Harness) {
        let session = harness.owner(11);
        assert_eq!(harness.reply(session, "11:99:500"), responses::CAR_NOT_FOUND);
    }

    #[rstest]
    fn renters_cannot_change_prices(harness: Harness) {
        let session = harness.renter();
        assert_eq!(
            harness.reply(session, "change_Price"),
            responses::INVALID_COMMAND
        );
        assert_eq!(harness.reply(session, "11:1:500"), responses::INVALID_COMMAND);
        assert_eq!(harness.registry.find(1).expect("find").price, 100);
    }

    #[rstest]
    fn owners_can_rent_too(harness: Harness) {
        let session = harness.owner(11);
        assert_eq!(harness.reply(session, "car_Id: 2"), responses::RENTAL_STARTED);
        assert_eq!(harness.reply(session, "pay_Rental"), responses::RENTAL_PAID);
    }

    #[test]
    fn bounded_reader_yields_each_line_then_eof() {
        let mut reader = BufReader::new(&b"post_Car\nend_Rental\n"[..]);
        let mut line = String::new();
        assert!(
            read_command_line(&mut reader, &mut line)
                .expect("read first line")
                .is_some()
        );
        assert_eq!(line, "post_Car\n");
        assert!(
            read_command_line(&mut reader, &mut line)
                .expect("read second line")
                .is_some()
        );
        assert_eq!(line, "end_Rental\n");
        assert!(
            read_command_line(&mut reader, &mut line)
                .expect("read at end of stream")
                .is_none()
        );
    }

    #[test]
    fn bounded_reader_rejects_overlong_lines() {
        let oversized = "x".repeat(MAX_LINE_BYTES + 1);
        let mut reader = BufReader::new(oversized.as_bytes());
        let mut line = String::new();
        let error = read_command_line(&mut reader, &mut line).expect_err("line exceeds bound");
        assert!(matches!(error, DispatchError::LineTooLong { .. }));
    }
}
