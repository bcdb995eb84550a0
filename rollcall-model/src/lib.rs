//! Core data model definitions shared across Rollcall crates.
#![allow(missing_docs)]

pub mod events;
pub mod ids;
pub mod log;
pub mod roster;
pub mod student;
pub mod user;

// Intentionally curated re-exports for downstream consumers.
pub use events::RosterEvent;
pub use ids::{StudentId, UserId};
pub use log::{DismissalAction, LogEntry};
pub use roster::{ActiveEntry, ActiveStudent, CheckReceipt, StudentStatus};
pub use student::{NewStudent, Student, StudentUpdate};
pub use user::{Role, User};
