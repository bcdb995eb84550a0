//! # Rollcall Server
//!
//! Dismissal tracking server.
//!
//! ## Overview
//!
//! Rollcall Server records barcode check-in/check-out events and keeps every
//! connected dashboard's active roster synchronized:
//!
//! - **Scan endpoints**: check-in/check-out with an at-most-one-active-entry
//!   guarantee and an append-only audit log
//! - **Live updates**: roster transitions fan out to dashboard sessions over
//!   WebSocket; dashboards fall back to polling for eventual consistency
//! - **Staff accounts**: username/password login with bearer tokens and
//!   role gating (teacher/admin)
//!
//! ## Architecture
//!
//! The server is built on Axum and uses:
//! - PostgreSQL for students, the active roster, and the dismissal log
//! - A tokio broadcast bus between the roster state machine and sessions

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
