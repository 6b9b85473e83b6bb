use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use itrax_assets::{Category, CategoryInput};
use itrax_core::time;
use itrax_infra::Filter;

use crate::app::dto::{JsonBody, ListQuery, PaginatedResponse};
use crate::app::errors::{ApiError, ApiResult, on_duplicate};
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::{OrgContext, PrincipalContext};

const CATEGORY: &str = "Category";
const NAME_EXISTS: &str = "Category already exists";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).put(update_category).delete(delete_category))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let filter = Filter::org(org.org_id()).search(query.search.as_deref());
    let page = services.stores.categories.list(&filter, query.page_request()).await?;
    Ok(Json(PaginatedResponse::from(page)).into_response())
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<CategoryInput>,
) -> ApiResult {
    let category = Category::create(org.org_id(), body, Some(principal.user_id()), time::now())?;
    services
        .stores
        .categories
        .insert(&category)
        .await
        .map_err(on_duplicate(NAME_EXISTS))?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, CATEGORY)?;
    let category = services
        .stores
        .categories
        .get(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY))?;
    Ok(Json(category).into_response())
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CategoryInput>,
) -> ApiResult {
    let id = parse_id(&id, CATEGORY)?;
    let categories = &services.stores.categories;
    let mut category = categories
        .get(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY))?;

    category.apply_update(body, time::now())?;
    if !categories.replace(&category).await.map_err(on_duplicate(NAME_EXISTS))? {
        return Err(ApiError::not_found(CATEGORY));
    }
    Ok(Json(category).into_response())
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, CATEGORY)?;
    services
        .stores
        .categories
        .delete(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(CATEGORY))?;
    Ok(Json(json!({ "message": "Category deleted successfully" })).into_response())
}
