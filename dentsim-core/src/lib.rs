//! Core of the DentSim client: domain types, the encounter state machine, the
//! backend seam, and the local token/profile cache.
//!
//! Nothing in this crate touches the terminal. The `dentsim` binary drives it.

pub mod auth;
pub mod backend;
pub mod catalog;
pub mod db;
pub mod encounter;
pub mod error;
pub mod gamification;
pub mod http;
pub mod schema;
pub mod timer;
pub mod types;
