//! Request body extraction.
//!
//! The app posts loosely typed JSON: a missing body means `{}`, and scalar
//! fields arrive as numbers or as strings interchangeably. [`Payload`]
//! handles the first, the [`lenient`] deserializers the second.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::state::AppState;

/// The user id for requests that do not name one.
pub const GUEST_USER: &str = "guest";

/// JSON body extractor where an empty body deserializes as `T::default()`.
///
/// Malformed JSON is rejected with an envelope `"400"`.
#[derive(Debug, Clone, Default)]
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        parse_body(&bytes).map(Payload)
    }
}

/// Body extractor for admin endpoints.
///
/// The body must carry a `token` field equal to the configured admin token,
/// otherwise the request is rejected with an envelope `"401"`. The remaining
/// fields deserialize into `T`; use [`serde::de::IgnoredAny`] when there are none.
#[derive(Debug, Clone)]
pub struct AdminPayload<T>(pub T);

impl<T> FromRequest<AppState> for AdminPayload<T>
where
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Payload(mut body) = Payload::<Map<String, Value>>::from_request(req, state).await?;

        let token = body.remove("token");
        let token = token.as_ref().and_then(Value::as_str).unwrap_or_default();
        if token.is_empty() || token != state.config().admin.token.expose_secret() {
            return Err(AppError::Unauthorized(
                "Unauthorized, admin token required".to_owned(),
            ));
        }

        serde_json::from_value(Value::Object(body))
            .map(AdminPayload)
            .map_err(|e| AppError::BadRequest(format!("invalid request body: {e}")))
    }
}

/// Parse a request body, treating blank input as `T::default()`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the body is not valid JSON for `T`.
pub fn parse_body<T: DeserializeOwned + Default>(bytes: &[u8]) -> Result<T, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| AppError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Resolve the acting user id, defaulting to [`GUEST_USER`].
#[must_use]
pub fn user_or_guest(user_id: Option<String>) -> String {
    user_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| GUEST_USER.to_owned())
}

/// Deserializers that accept a scalar as either a JSON number or a string.
///
/// Values that cannot be interpreted become `None` rather than an error, so a
/// handler can report the missing field itself.
pub mod lenient {
    use mall_core::Money;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `Option<i64>` from a number or numeric string.
    ///
    /// # Errors
    ///
    /// Never fails on content; only propagates deserializer errors.
    pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_i64))
    }

    /// `Option<String>` from a string, number or boolean.
    ///
    /// # Errors
    ///
    /// Never fails on content; only propagates deserializer errors.
    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    /// `Option<bool>` from a boolean or the strings `"true"`/`"false"`.
    ///
    /// # Errors
    ///
    /// Never fails on content; only propagates deserializer errors.
    pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Bool(b)) => Some(b),
            Some(Value::String(s)) => Some(s.trim().eq_ignore_ascii_case("true")),
            _ => None,
        })
    }

    /// `Option<Money>` from a number or decimal string.
    ///
    /// # Errors
    ///
    /// Never fails on content; only propagates deserializer errors.
    pub fn money<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Money>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => Money::parse(&n.to_string()).ok(),
            Some(Value::String(s)) => Money::parse(&s).ok(),
            _ => None,
        })
    }

    /// `Option<Vec<i64>>`: `None` unless the value is an array. Elements that
    /// are not integers are dropped.
    ///
    /// # Errors
    ///
    /// Never fails on content; only propagates deserializer errors.
    pub fn i64_list<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<i64>>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Array(items)) => Some(items.iter().filter_map(value_to_i64).collect()),
            _ => None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default, rename_all = "camelCase")]
    struct Body {
        #[serde(deserialize_with = "lenient::string")]
        user_id: Option<String>,
        #[serde(deserialize_with = "lenient::i64")]
        goods_id: Option<i64>,
        #[serde(deserialize_with = "lenient::bool")]
        selected: Option<bool>,
        #[serde(deserialize_with = "lenient::money")]
        order_amount: Option<mall_core::Money>,
        #[serde(deserialize_with = "lenient::i64_list")]
        item_ids: Option<Vec<i64>>,
    }

    #[test]
    fn test_blank_body_is_default() {
        let body: Body = parse_body(b"").unwrap();
        assert!(body.goods_id.is_none());
        let body: Body = parse_body(b"  \n").unwrap();
        assert!(body.user_id.is_none());
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let err = parse_body::<Body>(b"{not json").unwrap_err();
        assert_eq!(err.code(), "400");
    }

    #[test]
    fn test_numbers_and_strings_both_accepted() {
        let a: Body =
            parse_body(br#"{"userId": 7, "goodsId": "42", "selected": "true", "orderAmount": 99.5}"#)
                .unwrap();
        assert_eq!(a.user_id.as_deref(), Some("7"));
        assert_eq!(a.goods_id, Some(42));
        assert_eq!(a.selected, Some(true));
        assert_eq!(a.order_amount.unwrap().to_fixed(), "99.50");

        let b: Body = parse_body(br#"{"goodsId": "abc", "orderAmount": "oops", "selected": null}"#)
            .unwrap();
        assert_eq!(b.goods_id, None);
        assert_eq!(b.order_amount, None);
        assert_eq!(b.selected, None);
    }

    #[test]
    fn test_id_lists() {
        let body: Body = parse_body(br#"{"itemIds": [1, "2", "x", 3.0]}"#).unwrap();
        assert_eq!(body.item_ids, Some(vec![1, 2, 3]));
        let body: Body = parse_body(br#"{"itemIds": "1,2"}"#).unwrap();
        assert_eq!(body.item_ids, None);
    }

    #[test]
    fn test_user_or_guest() {
        assert_eq!(user_or_guest(None), "guest");
        assert_eq!(user_or_guest(Some(String::new())), "guest");
        assert_eq!(user_or_guest(Some("u1".to_owned())), "u1");
    }
}
