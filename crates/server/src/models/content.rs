//! Home/mine page content and recorded mock responses.

use serde::Serialize;

/// A home page banner.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: i64,
    pub img_url: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
}

/// An icon menu entry (home nine-grid or mine function list).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuEntry {
    pub id: i64,
    pub menu_icon: Option<String>,
    pub menu_name: Option<String>,
    pub menu_code: Option<String>,
    pub h5url: Option<String>,
}

/// A tab strip entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tab {
    pub id: i64,
    pub name: Option<String>,
    pub code: Option<String>,
}

/// A recorded response replayed by the mock fallback.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiMock {
    pub id: i64,
    pub path: String,
    pub method: String,
    pub response_body: String,
}

impl ApiMock {
    /// Read `data.<field>` from the recorded body as a string, if present.
    #[must_use]
    pub fn data_field(&self, field: &str) -> Option<String> {
        let root: serde_json::Value = serde_json::from_str(&self.response_body).ok()?;
        root.get("data")?
            .get(field)?
            .as_str()
            .map(ToOwned::to_owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock(body: &str) -> ApiMock {
        ApiMock {
            id: 1,
            path: "/home/queryHomePageInfo".to_owned(),
            method: "POST".to_owned(),
            response_body: body.to_owned(),
        }
    }

    #[test]
    fn test_data_field() {
        let m = mock(r#"{"code":"200","data":{"adUrl":"https://ad.example/x.png"}}"#);
        assert_eq!(
            m.data_field("adUrl").as_deref(),
            Some("https://ad.example/x.png")
        );
        assert_eq!(m.data_field("missing"), None);
    }

    #[test]
    fn test_data_field_tolerates_bad_json() {
        assert_eq!(mock("not json").data_field("adUrl"), None);
        assert_eq!(mock(r#"{"data":{"adUrl":3}}"#).data_field("adUrl"), None);
    }
}
