//! Shipping addresses.

use axum::extract::State;
use serde::Deserialize;
use tracing::instrument;

use mall_core::AddressId;

use crate::db::AddressRepository;
use crate::db::addresses::AddressFields;
use crate::envelope::{ApiJson, ok};
use crate::error::{AppError, Result, missing};
use crate::extract::{Payload, lenient, user_or_guest};
use crate::models::Address;
use crate::state::AppState;

fn demo_address() -> AddressFields {
    AddressFields {
        name: "张三".to_owned(),
        phone: "13800138000".to_owned(),
        region: "北京市朝阳区".to_owned(),
        detail: "建国路88号SOHO现代城".to_owned(),
        label: "家".to_owned(),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressRequest {
    #[serde(deserialize_with = "lenient::string")]
    pub user_id: Option<String>,
    #[serde(deserialize_with = "lenient::i64")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub region: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub detail: Option<String>,
    #[serde(deserialize_with = "lenient::bool")]
    pub is_default: Option<bool>,
    #[serde(deserialize_with = "lenient::string")]
    pub label: Option<String>,
}

impl AddressRequest {
    /// Overwrite the fields present in the request.
    fn patch(self, address: &mut Address) {
        if let Some(name) = self.name {
            address.name = name;
        }
        if let Some(phone) = self.phone {
            address.phone = phone;
        }
        if let Some(region) = self.region {
            address.region = region;
        }
        if let Some(detail) = self.detail {
            address.detail = detail;
        }
        if let Some(label) = self.label {
            address.label = label;
        }
        if let Some(is_default) = self.is_default {
            address.is_default = is_default;
        }
    }
}

/// Load the address named in the request, checking the caller owns it.
async fn owned_address(
    repo: &AddressRepository<'_>,
    id: Option<i64>,
    user_id: &str,
) -> Result<Address> {
    let id = id.ok_or_else(|| missing("id"))?;
    let address = repo
        .get_by_id(AddressId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Address not found".to_owned()))?;
    if address.user_id != user_id {
        return Err(AppError::Forbidden(
            "Address belongs to another user".to_owned(),
        ));
    }
    Ok(address)
}

/// The user's addresses, default first. A user without any gets a demo one.
#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn list(
    State(state): State<AppState>,
    Payload(body): Payload<AddressRequest>,
) -> Result<ApiJson<Vec<Address>>> {
    let repo = AddressRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);

    let mut addresses = repo.list(&user_id).await?;
    if addresses.is_empty() {
        repo.create(&user_id, &demo_address(), true).await?;
        tracing::info!(user_id, "Created demo address");
        addresses = repo.list(&user_id).await?;
    }

    Ok(ok(addresses))
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id))]
pub async fn add(
    State(state): State<AppState>,
    Payload(body): Payload<AddressRequest>,
) -> Result<ApiJson<Address>> {
    let user_id = user_or_guest(body.user_id);
    let fields = AddressFields {
        name: body.name.unwrap_or_default(),
        phone: body.phone.unwrap_or_default(),
        region: body.region.unwrap_or_default(),
        detail: body.detail.unwrap_or_default(),
        label: body.label.unwrap_or_default(),
    };

    let address = AddressRepository::new(state.pool())
        .create(&user_id, &fields, body.is_default.unwrap_or(false))
        .await?;

    Ok(ok(address))
}

/// Patch an address. An absent `isDefault` leaves the flag as it is.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, id = ?body.id))]
pub async fn update(
    State(state): State<AppState>,
    Payload(body): Payload<AddressRequest>,
) -> Result<ApiJson<Address>> {
    let repo = AddressRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id.clone());
    let mut address = owned_address(&repo, body.id, &user_id).await?;

    body.patch(&mut address);
    repo.update(&address).await?;

    Ok(ok(address))
}

/// Delete an address, promoting the newest remaining one if it was the default.
#[instrument(skip(state, body), fields(user_id = ?body.user_id, id = ?body.id))]
pub async fn delete(
    State(state): State<AppState>,
    Payload(body): Payload<AddressRequest>,
) -> Result<ApiJson<&'static str>> {
    let repo = AddressRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);
    let address = owned_address(&repo, body.id, &user_id).await?;
    repo.delete(&address).await?;

    Ok(ok("Address deleted"))
}

#[instrument(skip(state, body), fields(user_id = ?body.user_id, id = ?body.id))]
pub async fn set_default(
    State(state): State<AppState>,
    Payload(body): Payload<AddressRequest>,
) -> Result<ApiJson<&'static str>> {
    let repo = AddressRepository::new(state.pool());
    let user_id = user_or_guest(body.user_id);
    let address = owned_address(&repo, body.id, &user_id).await?;
    repo.set_default(&address).await?;

    Ok(ok("Default address set"))
}
