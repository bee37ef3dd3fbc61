//! Command parsing, execution, and response framing.
//!
//! A connection's lifetime is a sequence of line-oriented commands. The
//! [`Command`] parser turns raw lines into typed commands, the
//! [`SessionConnectionHandler`] executes them against the registry and
//! session manager, and the [`ResponseWriter`] frames the canonical
//! replies back to the client.

mod command;
mod errors;
mod handler;
mod listing;
mod reply;
pub mod responses;

pub use self::command::Command;
pub use self::errors::DispatchError;
pub use self::handler::{Outcome, SessionConnectionHandler};
pub use self::listing::{ListingEntry, render_listing};
pub use self::reply::ResponseWriter;
