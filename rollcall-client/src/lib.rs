//! Dashboard-session library for Rollcall.
//!
//! Each dashboard holds one [`DashboardSession`]: a locally coherent view of
//! who is active right now, reconciled from two sources that race freely
//! against each other:
//!
//! - push events from the server's broadcast channel (primary, low latency)
//! - a periodic full poll of the roster and student directory (fallback)
//!
//! The poll guarantees eventual consistency even when the push channel
//! silently drops messages; a missed event can therefore leave the view
//! stale for at most one poll interval (5 seconds by default). Snapshots are
//! authoritative and supersede any locally held state.

pub mod api;
pub mod directory;
pub mod enrich;
pub mod projection;
pub mod session;

pub use api::{ClientError, RosterApi, RosterFetch};
pub use directory::StudentDirectory;
pub use enrich::merge_student;
pub use projection::{OrderPolicy, RosterEffect, RosterProjection};
pub use session::{DashboardSession, RosterObserver, SessionConfig};
