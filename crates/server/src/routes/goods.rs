//! Goods listing, search, detail and event tracking.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mall_core::{GoodsId, StatEffect};

use crate::db::goods::{GoodsFilter, GoodsSort};
use crate::db::{GoodsRepository, Page, PageRequest, TrackEventRepository};
use crate::envelope::{ApiJson, Envelope, ok};
use crate::error::{AppError, Result, missing};
use crate::extract::{Payload, lenient};
use crate::models::Goods;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 15;
const STORE_GOODS_LIMIT: i64 = 10;

/// Resolve the listing order. An explicit `sort` wins over `strategy`.
#[must_use]
pub fn resolve_sort(strategy: Option<&str>, sort: Option<&str>) -> GoodsSort {
    if let Some(sort) = sort.filter(|s| !s.is_empty()) {
        return match sort {
            "priceAsc" => GoodsSort::PriceAsc,
            "priceDesc" => GoodsSort::PriceDesc,
            "ratingDesc" => GoodsSort::RatingDesc,
            "newArrival" => GoodsSort::NewArrival,
            _ => GoodsSort::SalesDesc,
        };
    }
    match strategy.unwrap_or_default() {
        "" | "smart" => GoodsSort::Smart,
        "topRated" => GoodsSort::RatingDesc,
        "newArrival" => GoodsSort::NewArrival,
        _ => GoodsSort::SalesDesc,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoodsListRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub code: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub page_no: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub page_size: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub strategy: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub sort: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub keyword: Option<String>,
}

impl GoodsListRequest {
    fn page(&self) -> PageRequest {
        PageRequest::one_based(
            self.page_no.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoodsPage {
    pub goods_list: Vec<Goods>,
    pub total_count: i64,
    pub total_page_count: i64,
}

impl From<Page<Goods>> for GoodsPage {
    fn from(page: Page<Goods>) -> Self {
        Self {
            total_count: page.total,
            total_page_count: page.total_pages(),
            goods_list: page.items,
        }
    }
}

/// Paged goods listing.
///
/// Without a category, promoted goods come first. A category hides promoted
/// goods and falls back to the whole catalog when it has none.
#[instrument(skip(state, body), fields(code = ?body.code))]
pub async fn list(
    State(state): State<AppState>,
    Payload(body): Payload<GoodsListRequest>,
) -> Result<ApiJson<GoodsPage>> {
    let repo = GoodsRepository::new(state.pool());
    let request = body.page();

    let page = match body.code.as_deref().filter(|c| !c.is_empty()) {
        None => {
            repo.list(&GoodsFilter::storefront(), GoodsSort::PromotedFirst, request)
                .await?
        }
        Some(code) => {
            let sort = resolve_sort(body.strategy.as_deref(), body.sort.as_deref());
            let mut filter = GoodsFilter {
                category_code: Some(code.to_owned()),
                exclude_promoted: true,
                ..GoodsFilter::storefront()
            };
            let page = repo.list(&filter, sort, request).await?;
            if page.total == 0 {
                filter.category_code = None;
                repo.list(&filter, sort, request).await?
            } else {
                page
            }
        }
    };

    Ok(ok(page.into()))
}

/// Keyword search over the non-promoted catalog.
#[instrument(skip(state, body), fields(keyword = ?body.keyword))]
pub async fn search(
    State(state): State<AppState>,
    Payload(body): Payload<GoodsListRequest>,
) -> Result<ApiJson<GoodsPage>> {
    let keyword = body
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search keyword must not be empty".to_owned()))?;

    let filter = GoodsFilter {
        exclude_promoted: true,
        keyword: Some(keyword.to_owned()),
        ..GoodsFilter::storefront()
    };
    let sort = resolve_sort(None, body.sort.as_deref());
    let page = GoodsRepository::new(state.pool())
        .list(&filter, sort, body.page())
        .await?;

    Ok(ok(page.into()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GoodsIdRequest {
    #[serde(deserialize_with = "lenient::i64")]
    pub goods_id: Option<i64>,
}

async fn find_goods(state: &AppState, goods_id: Option<i64>) -> Result<Goods> {
    let not_found = || AppError::NotFound("Goods not found".to_owned());
    let id = goods_id.ok_or_else(not_found)?;
    GoodsRepository::new(state.pool())
        .get_by_id(GoodsId::new(id))
        .await?
        .ok_or_else(not_found)
}

#[derive(Debug, Serialize)]
pub struct GoodsDetail {
    pub goods: Goods,
}

#[instrument(skip(state, body), fields(goods_id = ?body.goods_id))]
pub async fn detail(
    State(state): State<AppState>,
    Payload(body): Payload<GoodsIdRequest>,
) -> Result<ApiJson<GoodsDetail>> {
    let goods = find_goods(&state, body.goods_id).await?;
    Ok(ok(GoodsDetail {
        goods: goods.with_detail_placeholders(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreGoods {
    pub goods_list: Vec<Goods>,
}

/// Other goods from the same category.
#[instrument(skip(state, body), fields(goods_id = ?body.goods_id))]
pub async fn store_goods(
    State(state): State<AppState>,
    Payload(body): Payload<GoodsIdRequest>,
) -> Result<ApiJson<StoreGoods>> {
    let goods = find_goods(&state, body.goods_id).await?;
    let goods_list = GoodsRepository::new(state.pool())
        .list_by_category(goods.category_code.as_deref(), STORE_GOODS_LIMIT)
        .await?;
    Ok(ok(StoreGoods { goods_list }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub goods_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub event: Option<String>,
}

/// Record an analytics event and bump the matching goods counter.
///
/// Events for unknown goods are still recorded.
#[instrument(skip(state, body), fields(goods_id = ?body.goods_id, event = ?body.event))]
pub async fn track(
    State(state): State<AppState>,
    Payload(body): Payload<TrackRequest>,
) -> Result<ApiJson<()>> {
    let goods_id = body
        .goods_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing("goodsId"))?;
    let event = body
        .event
        .filter(|e| !e.is_empty())
        .ok_or_else(|| missing("event"))?;
    let goods_id = goods_id
        .trim()
        .parse::<i64>()
        .map(GoodsId::new)
        .map_err(|_| AppError::BadRequest("goodsId must be numeric".to_owned()))?;

    TrackEventRepository::new(state.pool())
        .record(goods_id, &event)
        .await?;

    let goods = GoodsRepository::new(state.pool());
    match StatEffect::for_event(&event) {
        StatEffect::View => {
            goods.increment_views(goods_id).await?;
        }
        StatEffect::Sale => {
            goods.increment_sales(goods_id).await?;
        }
        StatEffect::None => {}
    }

    Ok(Json(Envelope::empty()))
}
