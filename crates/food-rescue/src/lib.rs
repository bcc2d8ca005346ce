//! Matching and allocation engine for surplus-food logistics.
//!
//! The [`allocation`] module pairs donated inventory lots with the outstanding
//! needs of beneficiary organisations and commits confirmed matches as atomic
//! quantity transfers.

pub mod allocation;
pub mod config;
pub mod error;
pub mod telemetry;
