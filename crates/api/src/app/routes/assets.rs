use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use itrax_assets::{Asset, AssetInput, EXPORT_FIELDS};
use itrax_core::{OrgId, time};
use itrax_infra::Filter;

use crate::app::dto::{JsonBody, ListQuery, PaginatedResponse};
use crate::app::errors::{ApiError, ApiResult, on_duplicate};
use crate::app::routes::common::{csv_download, parse_id};
use crate::app::services::AppServices;
use crate::context::{OrgContext, PrincipalContext};

const ASSET: &str = "Asset";
const TAG_EXISTS: &str = "Asset tag already exists";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route("/export/download", get(export_assets))
        .route("/:id", get(get_asset).put(update_asset).delete(delete_asset))
}

fn asset_filter(org_id: OrgId, query: &ListQuery) -> Filter {
    Filter::org(org_id)
        .search(query.search.as_deref())
        .eq_opt("status", query.status.as_deref())
        .eq_opt("category", query.category.as_deref())
        .eq_opt("location", query.location.as_deref())
}

pub async fn list_assets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let page = services
        .stores
        .assets
        .list(&asset_filter(org.org_id(), &query), query.page_request())
        .await?;
    Ok(Json(PaginatedResponse::from(page)).into_response())
}

pub async fn create_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<AssetInput>,
) -> ApiResult {
    let asset = Asset::create(org.org_id(), body.validate()?, Some(principal.user_id()), time::now());
    services
        .stores
        .assets
        .insert(&asset)
        .await
        .map_err(on_duplicate(TAG_EXISTS))?;
    Ok((StatusCode::CREATED, Json(asset)).into_response())
}

pub async fn get_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let asset = load(&services, org.org_id(), &id).await?;
    Ok(Json(asset).into_response())
}

pub async fn update_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<AssetInput>,
) -> ApiResult {
    let valid = body.validate()?;
    let mut asset = load(&services, org.org_id(), &id).await?;
    asset.apply_update(valid, time::now());

    let found = services
        .stores
        .assets
        .replace(&asset)
        .await
        .map_err(on_duplicate(TAG_EXISTS))?;
    if !found {
        return Err(ApiError::not_found(ASSET));
    }
    Ok(Json(asset).into_response())
}

pub async fn delete_asset(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, ASSET)?;
    services
        .stores
        .assets
        .delete(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(ASSET))?;
    Ok(Json(json!({ "message": "Asset deleted successfully" })).into_response())
}

pub async fn export_assets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let assets = services
        .stores
        .assets
        .find_all(&asset_filter(org.org_id(), &query))
        .await?;
    csv_download("assets.csv", &EXPORT_FIELDS, assets.iter().map(Asset::export_row))
}

async fn load(services: &AppServices, org_id: OrgId, raw_id: &str) -> Result<Asset, ApiError> {
    let id = parse_id(raw_id, ASSET)?;
    services
        .stores
        .assets
        .get(org_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(ASSET))
}
