//! App account registration, login and profile.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use crate::envelope::{ApiJson, ok};
use crate::error::Result;
use crate::extract::{Payload, lenient};
use crate::middleware::BearerToken;
use crate::services::auth::{AuthError, AuthService, UserProfile};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub account: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub password: Option<String>,
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Payload(body): Payload<CredentialsRequest>,
) -> Result<ApiJson<UserProfile>> {
    let profile = AuthService::new(state.pool())
        .register(
            body.account.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;
    tracing::info!(user_id = %profile.id, "User registered");

    Ok(ok(profile))
}

#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Payload(body): Payload<CredentialsRequest>,
) -> Result<ApiJson<UserProfile>> {
    let profile = AuthService::new(state.pool())
        .login(
            body.account.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;
    tracing::info!(user_id = %profile.id, "User logged in");

    Ok(ok(profile))
}

/// The profile of the user owning the bearer token.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<ApiJson<UserProfile>> {
    let token = token.ok_or(AuthError::InvalidToken)?;
    let profile = AuthService::new(state.pool()).profile(&token).await?;

    Ok(ok(profile))
}
