//! Authentication error types.

use thiserror::Error;

use mall_core::{AccountError, PasswordError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Account is neither a valid email nor a valid phone number.
    #[error("invalid account: {0}")]
    InvalidAccount(#[from] AccountError),

    /// Password missing or too weak.
    #[error("invalid password: {0}")]
    InvalidPassword(#[from] PasswordError),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email or phone already registered.
    #[error("{0} already registered")]
    AccountExists(&'static str),

    /// The account has been disabled by an administrator.
    #[error("account disabled")]
    Disabled,

    /// Missing or unknown session token.
    #[error("missing or invalid token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
