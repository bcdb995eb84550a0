//! Core library for the Rollcall dismissal server.
//!
//! Holds the roster state machine (check-in/check-out with durable audit
//! logging), the persistence ports and their Postgres implementations, the
//! broadcast bus that fans roster transitions out to dashboard sessions, and
//! the credential primitives used by the HTTP layer.
#![allow(missing_docs)]

pub mod auth;
pub mod broadcast;
pub mod database;
pub mod error;
pub mod roster;

pub use broadcast::{NoopBroadcaster, RosterBroadcaster, RosterEventBus, RosterEventFrame};
pub use database::PostgresDatabase;
pub use error::{Result, RosterError};
pub use roster::RosterService;
