//! Cart route handlers.
//!
//! Carts are keyed by the client-supplied `userId` (default `guest`) and
//! created lazily on the first add. Lines are grouped by store for display.

use std::collections::HashMap;

use axum::extract::State;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use mall_core::{CartItemId, GoodsId, GoodsStatus, StoreId};

use crate::db::carts::NewCartItem;
use crate::db::goods::{GoodsFilter, GoodsSort};
use crate::db::{CartRepository, GoodsRepository, PageRequest, MAX_PAGE_SIZE};
use crate::envelope::{ApiJson, Empty, ok};
use crate::error::{AppError, Result, missing};
use crate::extract::{AdminPayload, Payload, lenient, user_or_guest};
use crate::models::cart::{ItemFlags, clamp_quantity};
use crate::models::{CartItem, Store};
use crate::services::seeder::FALLBACK_STORE_NAME;
use crate::state::AppState;

const DEFAULT_VARIANT: &str = "default";
const DEFAULT_STORE_CODE: &str = "default";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::bool")]
    pub selected: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartItemId,
    pub code: String,
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub color: String,
    pub size: String,
    pub num: i64,
    pub select: bool,
    pub saved: bool,
    pub favorite: bool,
    pub compare: bool,
}

impl From<CartItem> for CartLine {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            code: item.code,
            img_url: item.img_url,
            description: item.description,
            price: item.price,
            color: item.color,
            size: item.size,
            num: item.num,
            select: item.selected,
            saved: item.saved,
            favorite: item.favorite,
            compare: item.compare,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreGroup {
    pub store_name: String,
    pub store_code: String,
    pub h5url: Option<String>,
    pub select: bool,
    pub goods_list: Vec<CartLine>,
}

impl StoreGroup {
    fn new(store: &Store) -> Self {
        Self {
            store_name: store.store_name.clone(),
            store_code: store.store_code.clone(),
            h5url: store.h5url.clone(),
            select: false,
            goods_list: Vec::new(),
        }
    }
}

/// Group cart lines by store, stores in the order their first line appears.
fn group_by_store(items: Vec<CartItem>, stores: &[Store]) -> Vec<StoreGroup> {
    let by_id: HashMap<StoreId, &Store> = stores.iter().map(|s| (s.id, s)).collect();
    let mut groups: Vec<StoreGroup> = Vec::new();
    let mut positions: HashMap<StoreId, usize> = HashMap::new();

    for item in items {
        let Some(store) = by_id.get(&item.store_id) else {
            continue;
        };
        let index = *positions.entry(item.store_id).or_insert_with(|| {
            groups.push(StoreGroup::new(store));
            groups.len() - 1
        });
        if let Some(group) = groups.get_mut(index) {
            group.goods_list.push(item.into());
        }
    }

    for group in &mut groups {
        group.select =
            !group.goods_list.is_empty() && group.goods_list.iter().all(|line| line.select);
    }
    groups
}

/// The user's cart grouped by store.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn list(
    State(state): State<AppState>,
    Payload(body): Payload<UserRequest>,
) -> Result<ApiJson<Vec<StoreGroup>>> {
    let repo = CartRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);
    let Some(cart) = repo.find_cart(&user_id).await? else {
        return Ok(ok(Vec::new()));
    };

    let items = repo.list_items(cart.id).await?;
    let stores = repo.list_stores().await?;
    Ok(ok(group_by_store(items, &stores)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub goods_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub num: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub size: Option<String>,
    #[serde(deserialize_with = "lenient::bool")]
    pub selected: Option<bool>,
    #[serde(deserialize_with = "lenient::bool")]
    pub saved: Option<bool>,
    #[serde(deserialize_with = "lenient::bool")]
    pub favorite: Option<bool>,
    #[serde(deserialize_with = "lenient::bool")]
    pub compare: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub store_code: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub store_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedItem {
    pub item_id: CartItemId,
    pub num: i64,
}

/// Add goods to the cart. Adding the same variant again raises its quantity.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, goods_id = ?body.goods_id))]
pub async fn add(
    State(state): State<AppState>,
    Payload(body): Payload<AddRequest>,
) -> Result<ApiJson<AddedItem>> {
    let goods_id = body
        .goods_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing("goodsId"))?;
    let goods_id = goods_id
        .trim()
        .parse::<i64>()
        .map(GoodsId::new)
        .map_err(|_| AppError::BadRequest("Invalid goodsId".to_owned()))?;
    let num = body.num.unwrap_or(1);
    if num < 1 {
        return Err(AppError::BadRequest("num must be at least 1".to_owned()));
    }
    let goods = GoodsRepository::new(state.pool())
        .get_by_id(goods_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Goods not found".to_owned()))?;

    let repo = CartRepository::new(state.pool());
    let cart = repo.get_or_create_cart(&user_or_guest(body.user_id)).await?;

    let store_code = body
        .store_code
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_STORE_CODE.to_owned());
    let store_name = body
        .store_name
        .filter(|n| !n.is_empty())
        .or_else(|| goods.store_name.clone())
        .unwrap_or_else(|| FALLBACK_STORE_NAME.to_owned());
    let store = repo
        .get_or_create_store(&store_code, &store_name, goods.h5url.as_deref())
        .await?;

    let color = body.color.unwrap_or_else(|| DEFAULT_VARIANT.to_owned());
    let size = body.size.unwrap_or_else(|| DEFAULT_VARIANT.to_owned());
    let flags = ItemFlags {
        selected: body.selected.unwrap_or(true),
        saved: body.saved.unwrap_or(false),
        favorite: body.favorite.unwrap_or(false),
        compare: body.compare.unwrap_or(false),
    };
    let code = goods.id.to_string();

    if let Some(mut existing) = repo.find_variant(cart.id, &code, &color, &size).await? {
        existing.num = clamp_quantity(existing.num.saturating_add(num));
        existing.selected = flags.selected;
        existing.saved = flags.saved;
        existing.favorite = flags.favorite;
        existing.compare = flags.compare;
        repo.update_item(&existing).await?;
        return Ok(ok(AddedItem {
            item_id: existing.id,
            num: existing.num,
        }));
    }

    let num = clamp_quantity(num);
    let item_id = repo
        .add_item(
            cart.id,
            &NewCartItem {
                store_id: store.id,
                code,
                img_url: goods.img_url,
                description: goods.description,
                price: goods.price,
                color,
                size,
                num,
                flags,
            },
        )
        .await?;

    Ok(ok(AddedItem { item_id, num }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub item_id: Option<i64>,
    #[serde(deserialize_with = "lenient::i64")]
    pub num: Option<i64>,
    #[serde(deserialize_with = "lenient::bool")]
    pub selected: Option<bool>,
    #[serde(deserialize_with = "lenient::bool")]
    pub saved: Option<bool>,
    #[serde(deserialize_with = "lenient::bool")]
    pub favorite: Option<bool>,
    #[serde(deserialize_with = "lenient::bool")]
    pub compare: Option<bool>,
}

/// Load a cart line, checking it belongs to `user_id`.
async fn owned_item(
    repo: &CartRepository<'_>,
    item_id: Option<i64>,
    user_id: &str,
) -> Result<CartItem> {
    let item_id = item_id.ok_or_else(|| missing("itemId"))?;
    let (item, owner) = repo
        .get_item_with_owner(CartItemId::new(item_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Cart item not found".to_owned()))?;
    if owner != user_id {
        return Err(AppError::Forbidden(
            "Cart item belongs to another user".to_owned(),
        ));
    }
    Ok(item)
}

/// Patch the quantity and flags of a line.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, item_id = ?body.item_id))]
pub async fn update_item(
    State(state): State<AppState>,
    Payload(body): Payload<ItemRequest>,
) -> Result<ApiJson<Empty>> {
    let repo = CartRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);
    let mut item = owned_item(&repo, body.item_id, &user_id).await?;

    if let Some(num) = body.num {
        item.num = clamp_quantity(num);
    }
    if let Some(selected) = body.selected {
        item.selected = selected;
    }
    if let Some(saved) = body.saved {
        item.saved = saved;
    }
    if let Some(favorite) = body.favorite {
        item.favorite = favorite;
    }
    if let Some(compare) = body.compare {
        item.compare = compare;
    }
    repo.update_item(&item).await?;

    Ok(ok(Empty {}))
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id, item_id = ?body.item_id))]
pub async fn remove_item(
    State(state): State<AppState>,
    Payload(body): Payload<ItemRequest>,
) -> Result<ApiJson<Empty>> {
    let repo = CartRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);
    let item = owned_item(&repo, body.item_id, &user_id).await?;
    repo.delete_item(item.id).await?;

    Ok(ok(Empty {}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoveItemsRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64_list")]
    pub item_ids: Option<Vec<i64>>,
}

/// Delete several lines. Lines the user does not own are skipped.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn remove_items(
    State(state): State<AppState>,
    Payload(body): Payload<RemoveItemsRequest>,
) -> Result<ApiJson<Empty>> {
    let ids = body.item_ids.ok_or_else(|| missing("itemIds"))?;
    let repo = CartRepository::new(state.pool());
    if let Some(cart) = repo.find_cart(&user_or_guest(body.user_id)).await? {
        let ids: Vec<CartItemId> = ids.into_iter().map(CartItemId::new).collect();
        repo.delete_items_in_cart(cart.id, &ids).await?;
    }

    Ok(ok(Empty {}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectStoreRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub store_code: Option<String>,
    #[serde(deserialize_with = "lenient::bool")]
    pub selected: Option<bool>,
}

/// Select or deselect every line of one store.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, store_code = ?body.store_code))]
pub async fn select_store(
    State(state): State<AppState>,
    Payload(body): Payload<SelectStoreRequest>,
) -> Result<ApiJson<Empty>> {
    let store_code = body
        .store_code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| missing("storeCode"))?;
    let repo = CartRepository::new(state.pool());
    let store = repo
        .find_store(&store_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".to_owned()))?;

    if let Some(cart) = repo.find_cart(&user_or_guest(body.user_id)).await? {
        repo.set_selected(cart.id, Some(store.id), body.selected.unwrap_or(true))
            .await?;
    }

    Ok(ok(Empty {}))
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn select_all(
    State(state): State<AppState>,
    Payload(body): Payload<UserRequest>,
) -> Result<ApiJson<Empty>> {
    let repo = CartRepository::new(state.pool());
    if let Some(cart) = repo.find_cart(&user_or_guest(body.user_id)).await? {
        repo.set_selected(cart.id, None, body.selected.unwrap_or(true))
            .await?;
    }

    Ok(ok(Empty {}))
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn clear(
    State(state): State<AppState>,
    Payload(body): Payload<UserRequest>,
) -> Result<ApiJson<Empty>> {
    let repo = CartRepository::new(state.pool());
    if let Some(cart) = repo.find_cart(&user_or_guest(body.user_id)).await? {
        repo.clear(cart.id).await?;
    }

    Ok(ok(Empty {}))
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub message: &'static str,
}

/// Delete every cart and cart line.
#[instrument(skip_all)]
pub async fn clear_all(
    State(state): State<AppState>,
    AdminPayload(_): AdminPayload<IgnoredAny>,
) -> Result<ApiJson<Cleared>> {
    CartRepository::new(state.pool()).clear_all().await?;
    tracing::info!("All carts cleared");

    Ok(ok(Cleared {
        message: "All cart data has been cleared",
    }))
}

#[derive(Debug, Serialize)]
pub struct MaybeLike {
    #[serde(rename = "imgUrl")]
    pub img_url: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Recommended goods shown under the cart.
#[instrument(skip(state))]
pub async fn maybe_like(State(state): State<AppState>) -> Result<ApiJson<Vec<MaybeLike>>> {
    let filter = GoodsFilter {
        recommended_only: true,
        status: Some(GoodsStatus::Active),
        ..GoodsFilter::default()
    };
    let page = GoodsRepository::new(state.pool())
        .list(
            &filter,
            GoodsSort::Column {
                column: "id",
                ascending: true,
            },
            PageRequest::new(0, MAX_PAGE_SIZE),
        )
        .await?;

    Ok(ok(page
        .items
        .into_iter()
        .map(|g| MaybeLike {
            img_url: g.img_url,
            description: g.description,
            price: g.price,
            kind: g.kind,
        })
        .collect()))
}

#[cfg(test)]
mod tests {
    use mall_core::CartId;

    use super::*;

    fn store(id: i64, code: &str) -> Store {
        Store {
            id: StoreId::new(id),
            store_name: format!("store {code}"),
            store_code: code.to_owned(),
            h5url: None,
        }
    }

    fn item(id: i64, store_id: i64, selected: bool) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            cart_id: CartId::new(1),
            store_id: StoreId::new(store_id),
            code: id.to_string(),
            img_url: None,
            description: None,
            price: Some("1.00".to_owned()),
            color: "default".to_owned(),
            size: "default".to_owned(),
            num: 1,
            selected,
            saved: false,
            favorite: false,
            compare: false,
        }
    }

    #[test]
    fn test_groups_follow_first_seen_order() {
        let stores = [store(1, "a"), store(2, "b")];
        let groups = group_by_store(
            vec![item(1, 2, true), item(2, 1, true), item(3, 2, false)],
            &stores,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].store_code, "b");
        assert_eq!(groups[0].goods_list.len(), 2);
        assert!(!groups[0].select, "one line in store b is unselected");
        assert_eq!(groups[1].store_code, "a");
        assert!(groups[1].select);
    }

    #[test]
    fn test_lines_without_store_are_dropped() {
        let groups = group_by_store(vec![item(1, 9, true)], &[store(1, "a")]);
        assert!(groups.is_empty());
    }
}
