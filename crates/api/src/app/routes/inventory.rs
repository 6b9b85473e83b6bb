use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use itrax_core::{OrgId, time};
use itrax_infra::Filter;
use itrax_inventory::{InventoryInput, InventoryItem};

use crate::app::dto::{JsonBody, ListQuery, PaginatedResponse};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::{OrgContext, PrincipalContext};

const ITEM: &str = "Inventory item";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let filter = Filter::org(org.org_id())
        .search(query.search.as_deref())
        .eq_opt("location", query.location.as_deref());
    let page = services
        .stores
        .inventory
        .list(&filter, query.page_request())
        .await?
        .map(InventoryItem::view);
    Ok(Json(PaginatedResponse::from(page)).into_response())
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<InventoryInput>,
) -> ApiResult {
    let item = InventoryItem::create(org.org_id(), body, Some(principal.user_id()), time::now())?;
    services.stores.inventory.insert(&item).await?;

    if item.is_low_stock() {
        tracing::info!(item_id = %item.id, quantity = item.quantity, "inventory item created below reorder level");
    }
    Ok((StatusCode::CREATED, Json(item.view())).into_response())
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let item = load(&services, org.org_id(), &id).await?;
    Ok(Json(item.view()).into_response())
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<InventoryInput>,
) -> ApiResult {
    let mut item = load(&services, org.org_id(), &id).await?;
    item.apply_update(body, time::now())?;
    if !services.stores.inventory.replace(&item).await? {
        return Err(ApiError::not_found(ITEM));
    }
    Ok(Json(item.view()).into_response())
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, ITEM)?;
    services
        .stores
        .inventory
        .delete(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(ITEM))?;
    Ok(Json(json!({ "message": "Inventory item deleted successfully" })).into_response())
}

async fn load(services: &AppServices, org_id: OrgId, raw_id: &str) -> Result<InventoryItem, ApiError> {
    let id = parse_id(raw_id, ITEM)?;
    services
        .stores
        .inventory
        .get(org_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(ITEM))
}
