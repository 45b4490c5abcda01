//! Mall Core - Shared types library.
//!
//! This crate provides common types used across all mall components:
//! - `server` - The HTTP backend serving the mobile app and the admin console
//! - `cli` - Command-line tools for migrations and fixture seeding
//!
//! # Architecture
//!
//! The core crate contains only types and their rules - no I/O, no database
//! access, no HTTP. Validation (accounts, passwords) and state machines (order
//! status) live here so they can be unit tested without a server.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, accounts, money and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
