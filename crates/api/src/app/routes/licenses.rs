//! Software licenses. Status is re-derived from the expiration date on every
//! write and again on read, so a license drifts into `ExpiringSoon` and
//! `Expired` without anyone touching it.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use serde_json::json;

use itrax_core::{OrgId, Page, time};
use itrax_infra::Filter;
use itrax_licenses::{License, LicenseInput, LicenseStatus, current_page};

use crate::app::dto::{JsonBody, ListQuery, PaginatedResponse};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::{OrgContext, PrincipalContext};

const LICENSE: &str = "License";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_licenses).post(create_license))
        .route("/:id", get(get_license).put(update_license).delete(delete_license))
}

fn current(mut license: License, now: DateTime<Utc>) -> License {
    license.status = license.status_at(now);
    license
}

/// The stored status can be stale, so a status filter is applied after each
/// license is brought up to date rather than in the store query.
pub async fn list_licenses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let filter = Filter::org(org.org_id()).search(query.search.as_deref());
    let request = query.page_request();
    let now = time::now();
    let licenses = &services.stores.licenses;

    let page = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => licenses.list(&filter, request).await?.map(|l| current(l, now)),
        Some(raw) => match LicenseStatus::parse(raw) {
            Some(status) => current_page(licenses.find_all(&filter).await?, Some(status), request, now),
            None => Page::new(Vec::new(), 0, request),
        },
    };
    Ok(Json(PaginatedResponse::from(page)).into_response())
}

pub async fn create_license(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<LicenseInput>,
) -> ApiResult {
    let license = License::create(org.org_id(), body, Some(principal.user_id()), time::now())?;
    services.stores.licenses.insert(&license).await?;
    Ok((StatusCode::CREATED, Json(license)).into_response())
}

pub async fn get_license(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let license = load(&services, org.org_id(), &id).await?;
    Ok(Json(current(license, time::now())).into_response())
}

pub async fn update_license(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<LicenseInput>,
) -> ApiResult {
    let mut license = load(&services, org.org_id(), &id).await?;
    license.apply_update(body, time::now())?;
    if !services.stores.licenses.replace(&license).await? {
        return Err(ApiError::not_found(LICENSE));
    }
    Ok(Json(license).into_response())
}

pub async fn delete_license(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, LICENSE)?;
    services
        .stores
        .licenses
        .delete(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(LICENSE))?;
    Ok(Json(json!({ "message": "License deleted successfully" })).into_response())
}

async fn load(services: &AppServices, org_id: OrgId, raw_id: &str) -> Result<License, ApiError> {
    let id = parse_id(raw_id, LICENSE)?;
    services
        .stores
        .licenses
        .get(org_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(LICENSE))
}
