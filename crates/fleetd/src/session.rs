//! Per-connection session records.
//!
//! A session is created when a connection is accepted and destroyed when
//! the connection closes or the rental ends. The session manager owns the
//! role table; vehicle state lives in the registry and is only referenced
//! from sessions by vehicle id.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::registry::OwnerId;

/// Session identifier, unique per live connection.
pub type SessionId = u64;

/// Registration state of one session.
///
/// The role advances along `Unregistered -> Renter` or
/// `Unregistered -> PendingOwnerId -> Owner`; once `Renter` or `Owner`
/// it is fixed for the connection's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    /// Connected but not yet registered.
    #[default]
    Unregistered,
    /// Sent `register_Owner` and owes an `owner_Id:` follow-up.
    PendingOwnerId,
    /// Registered renter.
    Renter,
    /// Registered owner with the given owner identity.
    Owner(OwnerId),
}

impl Role {
    /// Whether the session has completed registration.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        matches!(self, Self::Renter | Self::Owner(_))
    }

    /// The owner identity, when the session registered as an owner.
    #[must_use]
    pub fn owner_id(&self) -> Option<OwnerId> {
        match self {
            Self::Owner(id) => Some(*id),
            _ => None,
        }
    }
}

/// Errors surfaced by session table operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session id is not present in the table.
    #[error("session {session} not found")]
    NotFound { session: SessionId },
    /// The session table lock was poisoned by a panicking thread.
    #[error("session table lock poisoned")]
    Poisoned,
}

/// Allocates session ids and tracks each live session's role.
///
/// Ids come from an atomic counter, so the table grows and shrinks with
/// the set of live connections and carries no a-priori connection limit.
#[derive(Debug, Default)]
pub struct SessionManager {
    next_id: AtomicU64,
    roles: Mutex<HashMap<SessionId, Role>>,
}

impl SessionManager {
    /// Creates an empty session manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn roles(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, Role>>, SessionError> {
        self.roles.lock().map_err(|_| SessionError::Poisoned)
    }

    /// Allocates a fresh session in the `Unregistered` role.
    pub fn create_session(&self) -> Result<SessionId, SessionError> {
        let session = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.roles()?.insert(session, Role::Unregistered);
        Ok(session)
    }

    /// Looks up the role of a live session.
    pub fn get_role(&self, session: SessionId) -> Result<Role, SessionError> {
        self.roles()?
            .get(&session)
            .copied()
            .ok_or(SessionError::NotFound { session })
    }

    /// Replaces the role of a live session.
    pub fn set_role(&self, session: SessionId, role: Role) -> Result<(), SessionError> {
        match self.roles()?.get_mut(&session) {
            Some(slot) => {
                *slot = role;
                Ok(())
            }
            None => Err(SessionError::NotFound { session }),
        }
    }

    /// Removes a session record. Removing an absent session is a no-op.
    pub fn destroy_session(&self, session: SessionId) -> Result<(), SessionError> {
        self.roles()?.remove(&session);
        Ok(())
    }

    /// Number of live sessions, for diagnostics and tests.
    pub fn active_sessions(&self) -> Result<usize, SessionError> {
        Ok(self.roles()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_unique_monotonic_ids() {
        let sessions = SessionManager::new();
        let first = sessions.create_session().expect("create first");
        let second = sessions.create_session().expect("create second");
        assert!(second > first);
        assert_eq!(sessions.active_sessions().expect("count"), 2);
    }

    #[test]
    fn new_sessions_start_unregistered() {
        let sessions = SessionManager::new();
        let session = sessions.create_session().expect("create");
        assert_eq!(sessions.get_role(session).expect("role"), Role::Unregistered);
    }

    #[test]
    fn set_role_updates_live_session() {
        let sessions = SessionManager::new();
        let session = sessions.create_session().expect("create");
        sessions
            .set_role(session, Role::Owner(11))
            .expect("set role");
        assert_eq!(sessions.get_role(session).expect("role"), Role::Owner(11));
        assert_eq!(sessions.get_role(session).expect("role").owner_id(), Some(11));
    }

    #[test]
    fn destroyed_sessions_are_gone() {
        let sessions = SessionManager::new();
        let session = sessions.create_session().expect("create");
        sessions.destroy_session(session).expect("destroy");
        assert_eq!(
            sessions.get_role(session),
            Err(SessionError::NotFound { session })
        );
        // Destroying again is harmless.
        sessions.destroy_session(session).expect("destroy again");
    }

    #[test]
    fn set_role_rejects_unknown_session() {
        let sessions = SessionManager::new();
        assert_eq!(
            sessions.set_role(99, Role::Renter),
            Err(SessionError::NotFound { session: 99 })
        );
    }

    #[test]
    fn registration_predicates() {
        assert!(!Role::Unregistered.is_registered());
        assert!(!Role::PendingOwnerId.is_registered());
        assert!(Role::Renter.is_registered());
        assert!(Role::Owner(3).is_registered());
        assert_eq!(Role::Renter.owner_id(), None);
    }
}
