//! The `{code, msg, data}` envelope every endpoint responds with.

use axum::Json;
use serde::Serialize;

/// Envelope code for success.
pub const SUCCESS_CODE: &str = "200";

/// Uniform response wrapper.
///
/// Errors travel in `code`/`msg` with HTTP 200; see [`crate::error::AppError`].
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub code: String,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// A success envelope carrying `data`.
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE.to_owned(),
            msg: "success".to_owned(),
            data: Some(data),
        }
    }
}

impl Envelope<()> {
    /// An envelope with no data.
    pub fn failure(code: &str, msg: impl Into<String>) -> Self {
        Self {
            code: code.to_owned(),
            msg: msg.into(),
            data: None,
        }
    }

    /// A success envelope with `data: null`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            code: SUCCESS_CODE.to_owned(),
            msg: "success".to_owned(),
            data: None,
        }
    }
}

/// `data: {}` for mutations that have nothing to report.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Empty {}

/// Handler return type for envelope responses.
pub type ApiJson<T> = Json<Envelope<T>>;

/// Wrap `data` in a success envelope.
pub fn ok<T>(data: T) -> ApiJson<T> {
    Json(Envelope::success(data))
}
