//! Read-only report snapshots over the caller's org.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    response::IntoResponse,
    routing::get,
};

use itrax_auth::Role;
use itrax_core::time;
use itrax_infra::Filter;
use itrax_inventory::InventoryItem;
use itrax_reports::{Report, ReportKind, summarize};

use crate::app::dto::ListQuery;
use crate::app::errors::ApiResult;
use crate::app::routes::admin::employee_rows;
use crate::app::services::AppServices;
use crate::authz::require_admin;
use crate::context::{OrgContext, PrincipalContext};

const LOW_STOCK: &str = "Low Stock";
const IN_STOCK: &str = "In Stock";

pub fn router() -> Router {
    Router::new()
        .route("/assets", get(asset_report))
        .route("/licenses", get(license_report))
        .route("/inventory", get(inventory_report))
        .route("/employees", get(employee_report))
        .route("/tracking", get(tracking_report))
}

pub async fn asset_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let assets = services.stores.assets.find_all(&Filter::org(org.org_id())).await?;
    let summary = summarize(assets.iter().map(|a| a.status.as_str()));
    let report_id = query.report_id.filter(|id| !id.trim().is_empty());
    Ok(Json(Report::new(ReportKind::Assets, report_id, assets, summary)).into_response())
}

pub async fn license_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
) -> ApiResult {
    let now = time::now();
    let mut licenses = services.stores.licenses.find_all(&Filter::org(org.org_id())).await?;
    for license in &mut licenses {
        license.status = license.status_at(now);
    }
    let summary = summarize(licenses.iter().map(|l| l.status.as_str()));
    Ok(Json(Report::new(ReportKind::Licenses, None, licenses, summary)).into_response())
}

/// Inventory has no status of its own; the summary splits on stock level.
pub async fn inventory_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
) -> ApiResult {
    let items = services.stores.inventory.find_all(&Filter::org(org.org_id())).await?;
    let summary = summarize(
        items
            .iter()
            .map(|i| if i.is_low_stock() { LOW_STOCK } else { IN_STOCK }),
    );
    let views = items.into_iter().map(InventoryItem::view).collect();
    Ok(Json(Report::new(ReportKind::Inventory, None, views, summary)).into_response())
}

pub async fn employee_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    require_admin(&principal)?;
    let filter = Filter::org(org.org_id()).eq("role", Role::Employee.as_str());
    let rows = employee_rows(&services, &filter).await?;
    let summary = summarize(rows.iter().map(|r| r.status.as_str()));
    Ok(Json(Report::new(ReportKind::Employees, None, rows, summary)).into_response())
}

pub async fn tracking_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
) -> ApiResult {
    let orders = services.stores.orders.find_all(&Filter::org(org.org_id())).await?;
    let summary = summarize(orders.iter().map(|o| o.status.as_str()));
    Ok(Json(Report::new(ReportKind::Tracking, None, orders, summary)).into_response())
}
