//! Core types for the mall backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod account;
pub mod id;
pub mod money;
pub mod status;

pub use account::{Account, AccountError, PasswordError, validate_password};
pub use id::*;
pub use money::{Money, MoneyError};
pub use status::*;
