//! Fallback for paths without a handler: replay the recorded fixture response.

use axum::{
    Json,
    extract::{OriginalUri, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::db::ApiMockRepository;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::state::AppState;

/// Serve the body recorded for this path and method, or an envelope 404.
///
/// Looks up the full request path, also for misses under a nested prefix.
#[instrument(skip(state), fields(path = %uri.path()))]
pub async fn replay(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> Result<Response> {
    let mock = ApiMockRepository::new(state.pool())
        .find(uri.path(), method.as_str())
        .await?;

    Ok(match mock {
        Some(mock) => (
            [(header::CONTENT_TYPE, "application/json")],
            mock.response_body,
        )
            .into_response(),
        None => {
            tracing::debug!("No recorded response");
            (
                StatusCode::NOT_FOUND,
                Json(Envelope::failure("404", "Not Found")),
            )
                .into_response()
        }
    })
}
