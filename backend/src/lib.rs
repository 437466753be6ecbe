//! # Meeting Planner
//!
//! Backend for proposing meetings as sets of candidate time slots.
//!
//! An organizer submits a title, an optional description and any number of
//! slots typed as local wall-clock times. Each slot is checked against the
//! scheduling rules (lead time, same day, maximum length, working days and
//! business hours) before the meeting and all of its slots are stored
//! together.
//!
//! ## Architecture
//!
//! - [`models`]: identifiers, meetings, slots and the time-interval helpers
//! - [`services`]: the slot rule engine and the meeting workflow
//! - [`db`]: the storage trait with in-memory and Postgres backends
//! - [`config`]: TOML configuration with environment overrides
//! - [`clock`]: injectable source of "now"
//! - [`http`]: Axum JSON API (feature `http-server`)

// RepositoryError carries a structured context
#![allow(clippy::result_large_err)]

pub mod clock;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
