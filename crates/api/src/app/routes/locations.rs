use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use itrax_assets::{Location, LocationInput};
use itrax_core::time;
use itrax_infra::Filter;

use crate::app::dto::{JsonBody, ListQuery, PaginatedResponse};
use crate::app::errors::{ApiError, ApiResult, on_duplicate};
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::{OrgContext, PrincipalContext};

const LOCATION: &str = "Location";
const NAME_EXISTS: &str = "Location already exists";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/:id", get(get_location).put(update_location).delete(delete_location))
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let filter = Filter::org(org.org_id())
        .search(query.search.as_deref())
        .eq_opt("status", query.status.as_deref());
    let page = services.stores.locations.list(&filter, query.page_request()).await?;
    Ok(Json(PaginatedResponse::from(page)).into_response())
}

pub async fn create_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<LocationInput>,
) -> ApiResult {
    let location = Location::create(org.org_id(), body, Some(principal.user_id()), time::now())?;
    services
        .stores
        .locations
        .insert(&location)
        .await
        .map_err(on_duplicate(NAME_EXISTS))?;
    Ok((StatusCode::CREATED, Json(location)).into_response())
}

pub async fn get_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, LOCATION)?;
    let location = services
        .stores
        .locations
        .get(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(LOCATION))?;
    Ok(Json(location).into_response())
}

pub async fn update_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<LocationInput>,
) -> ApiResult {
    let id = parse_id(&id, LOCATION)?;
    let locations = &services.stores.locations;
    let mut location = locations
        .get(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(LOCATION))?;

    location.apply_update(body, time::now())?;
    if !locations.replace(&location).await.map_err(on_duplicate(NAME_EXISTS))? {
        return Err(ApiError::not_found(LOCATION));
    }
    Ok(Json(location).into_response())
}

pub async fn delete_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, LOCATION)?;
    services
        .stores
        .locations
        .delete(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(LOCATION))?;
    Ok(Json(json!({ "message": "Location deleted successfully" })).into_response())
}
