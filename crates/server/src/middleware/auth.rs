//! Bearer token extraction.
//!
//! The profile endpoint reads the session token from the `Authorization`
//! header. Both `Bearer <token>` and a bare token are accepted.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// The session token sent by the client, if any.
///
/// Never rejects: a missing or unreadable header yields `None` so the handler
/// can answer with an envelope `"401"`.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(BearerToken(token): BearerToken) -> Result<ApiJson<UserProfile>> {
///     let token = token.ok_or(AuthError::InvalidToken)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    fn from_header(value: &str) -> Option<String> {
        let value = value.trim();
        let token = match value.strip_prefix("Bearer ") {
            Some(rest) => rest.trim(),
            None if value == "Bearer" => "",
            None => value,
        };
        (!token.is_empty()).then(|| token.to_owned())
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(Self::from_header);

        Ok(Self(token))
    }
}
