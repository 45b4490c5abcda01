//! Home, mine and category page content.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::content::{MenuTable, TabTable};
use crate::db::{ApiMockRepository, CategoryRepository, ContentRepository};
use crate::envelope::{ApiJson, ok};
use crate::error::Result;
use crate::extract::{Payload, lenient};
use crate::models::catalog::ROOT_CATEGORY_CODE;
use crate::models::{Banner, Category, MenuEntry, Tab};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub banner_list: Vec<Banner>,
    pub ad_url: Option<String>,
    pub nine_menu_list: Vec<MenuEntry>,
    pub tab_list: Vec<Tab>,
}

/// Home page content. `adUrl` is only kept in the recorded fixture.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<ApiJson<HomePage>> {
    let content = ContentRepository::new(state.pool());
    let ad_url = ApiMockRepository::new(state.pool())
        .find("/home/queryHomePageInfo", "POST")
        .await?
        .and_then(|mock| mock.data_field("adUrl"));

    Ok(ok(HomePage {
        banner_list: content.banners().await?,
        ad_url,
        nine_menu_list: content.menus(MenuTable::HomeNineMenu).await?,
        tab_list: content.tabs(TabTable::Home).await?,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinePage {
    pub function_list: Vec<MenuEntry>,
    pub tab_list: Vec<Tab>,
}

#[instrument(skip(state))]
pub async fn mine(State(state): State<AppState>) -> Result<ApiJson<MinePage>> {
    let content = ContentRepository::new(state.pool());
    Ok(ok(MinePage {
        function_list: content.menus(MenuTable::MineFunction).await?,
        tab_list: content.tabs(TabTable::Mine).await?,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryList {
    pub category_list: Vec<Category>,
}

/// Level-1 categories.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<ApiJson<CategoryList>> {
    let category_list = CategoryRepository::new(state.pool()).list_level(1).await?;
    Ok(ok(CategoryList { category_list }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryContentRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryContent {
    pub banner_url: Option<String>,
    pub second_cate_list: Vec<SecondCategory>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondCategory {
    pub category_name: String,
    pub category_code: String,
    pub cate_list: Vec<LeafCategory>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafCategory {
    pub icon_url: Option<String>,
    pub category_name: String,
    pub category_code: String,
}

/// Second and third level categories below `code`.
///
/// When the root has no children every level-2 category is shown instead.
#[instrument(skip(state, body))]
pub async fn category_content(
    State(state): State<AppState>,
    Payload(body): Payload<CategoryContentRequest>,
) -> Result<ApiJson<CategoryContent>> {
    let repo = CategoryRepository::new(state.pool());
    let root = body
        .code
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| ROOT_CATEGORY_CODE.to_owned());

    let banner_url = repo.get_by_code(&root).await?.and_then(|c| c.banner_url);

    let mut second = repo.children(&root).await?;
    if second.is_empty() {
        second = repo.list_level(2).await?;
    }

    let mut second_cate_list = Vec::with_capacity(second.len());
    for category in second {
        let cate_list = repo
            .children(&category.code)
            .await?
            .into_iter()
            .map(|leaf| LeafCategory {
                icon_url: leaf.icon_url,
                category_name: leaf.name,
                category_code: leaf.code,
            })
            .collect();
        second_cate_list.push(SecondCategory {
            category_name: category.name,
            category_code: category.code,
            cate_list,
        });
    }

    Ok(ok(CategoryContent {
        banner_url,
        second_cate_list,
    }))
}
