//! Admin-only employee management.
//!
//! Employees are ordinary user accounts with the `EMPLOYEE` role, scoped to
//! the caller's org. Rows returned here carry assignment figures that are
//! looked up per request rather than stored.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use itrax_assets::AssetStatus;
use itrax_auth::{Role, User};
use itrax_core::{OrgId, Page, RecordId, time};
use itrax_employees::{EXPORT_FIELDS, EmployeeInput, EmployeeRow, temp_password};
use itrax_infra::Filter;

use crate::app::dto::{JsonBody, ListQuery, ListResponse};
use crate::app::errors::{ApiError, ApiResult, on_duplicate};
use crate::app::routes::common::{csv_download, parse_id};
use crate::app::services::AppServices;
use crate::authz::require_admin;
use crate::context::{OrgContext, PrincipalContext};

const EMPLOYEE: &str = "Employee";
const EMAIL_EXISTS: &str = "Email already exists";

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/export/download", get(export_employees))
        .route(
            "/employees/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

pub async fn list_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    require_admin(&principal)?;
    let page = services
        .stores
        .users
        .list(&employee_filter(org.org_id(), &query), query.page_request())
        .await?;

    let mut rows = Vec::with_capacity(page.items.len());
    for user in &page.items {
        rows.push(employee_row(&services, user).await?);
    }
    Ok(Json(ListResponse::from(Page::new(rows, page.total, page.request))).into_response())
}

pub async fn create_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<EmployeeInput>,
) -> ApiResult {
    require_admin(&principal)?;
    let valid = body.validate()?;
    let users = &services.stores.users;

    if users
        .find_one(&Filter::org(org.org_id()).eq("email", &valid.email))
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(EMAIL_EXISTS));
    }

    let password = temp_password();
    let hash = services.hash_password(&password).await?;
    let user = valid.into_user(org.org_id(), hash);
    users.insert(&user).await.map_err(on_duplicate(EMAIL_EXISTS))?;

    tracing::info!(user_id = %user.id, created_by = %principal.user_id(), "employee account created");
    let row = employee_row(&services, &user).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": row, "tempPassword": password }))).into_response())
}

pub async fn get_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require_admin(&principal)?;
    let user = load(&services, org.org_id(), &id).await?;
    let row = employee_row(&services, &user).await?;
    Ok(Json(json!({ "data": row })).into_response())
}

pub async fn update_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<EmployeeInput>,
) -> ApiResult {
    require_admin(&principal)?;
    let valid = body.validate()?;
    let mut user = load(&services, org.org_id(), &id).await?;
    let users = &services.stores.users;

    let taken = Filter::org(org.org_id()).eq("email", &valid.email).exclude(user.id);
    if users.find_one(&taken).await?.is_some() {
        return Err(ApiError::bad_request(EMAIL_EXISTS));
    }

    valid.apply_to(&mut user, time::now());
    if !users.replace(&user).await.map_err(on_duplicate(EMAIL_EXISTS))? {
        return Err(ApiError::not_found(EMPLOYEE));
    }

    let row = employee_row(&services, &user).await?;
    Ok(Json(json!({ "data": row })).into_response())
}

pub async fn delete_employee(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require_admin(&principal)?;
    let user = load(&services, org.org_id(), &id).await?;
    services
        .stores
        .users
        .delete(org.org_id(), user.id)
        .await?
        .ok_or_else(|| ApiError::not_found(EMPLOYEE))?;

    tracing::info!(user_id = %user.id, deleted_by = %principal.user_id(), "employee account deleted");
    Ok(Json(json!({ "message": "Employee deleted successfully" })).into_response())
}

pub async fn export_employees(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    require_admin(&principal)?;
    let rows = employee_rows(&services, &employee_filter(org.org_id(), &query)).await?;
    csv_download("employees.csv", &EXPORT_FIELDS, rows.iter().map(EmployeeRow::export_row))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn employee_filter(org_id: OrgId, query: &ListQuery) -> Filter {
    Filter::org(org_id)
        .eq("role", Role::Employee.as_str())
        .search(query.search.as_deref())
}

/// Every employee matching `filter`, with assignment figures.
pub(crate) async fn employee_rows(services: &AppServices, filter: &Filter) -> Result<Vec<EmployeeRow>, ApiError> {
    let users = services.stores.users.find_all(filter).await?;
    let mut rows = Vec::with_capacity(users.len());
    for user in &users {
        rows.push(employee_row(services, user).await?);
    }
    Ok(rows)
}

/// Assets count as assigned to an employee when their `assignedTo` holds the
/// employee's full name.
async fn employee_row(services: &AppServices, user: &User) -> Result<EmployeeRow, ApiError> {
    let assigned = Filter::org(user.org_id)
        .eq("status", AssetStatus::Assigned.as_str())
        .eq("assignedTo", user.full_name());
    let assigned_assets = services.stores.assets.count(&assigned).await?;

    let location_name = match user.location_id {
        Some(location_id) => location_name(services, user.org_id, location_id).await?,
        None => None,
    };
    Ok(EmployeeRow::new(user, assigned_assets, location_name))
}

async fn location_name(
    services: &AppServices,
    org_id: OrgId,
    location_id: RecordId,
) -> Result<Option<String>, ApiError> {
    let location = services.stores.locations.get(org_id, location_id).await?;
    Ok(location.map(|l| l.name))
}

async fn load(services: &AppServices, org_id: OrgId, raw_id: &str) -> Result<User, ApiError> {
    let id = parse_id(raw_id, EMPLOYEE)?;
    services
        .stores
        .users
        .get(org_id, id)
        .await?
        .filter(|u| u.role == Role::Employee)
        .ok_or_else(|| ApiError::not_found(EMPLOYEE))
}
