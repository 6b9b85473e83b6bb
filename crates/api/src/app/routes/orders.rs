//! Procurement order tracking.
//!
//! Reads are open to every authenticated user; writes are admin only. The
//! order's `status` is only ever changed through [`Order::transition`], so it
//! always equals the stage of its latest tracking entry.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde_json::json;

use itrax_core::{OrgId, time};
use itrax_infra::Filter;
use itrax_notifications::Notification;
use itrax_orders::{EXPORT_FIELDS, Order, OrderCreator, OrderInput, generate_order_id, parse_status_change};

use crate::app::dto::{JsonBody, ListQuery, ListResponse, StatusChangeRequest};
use crate::app::errors::{ApiError, ApiResult, on_duplicate};
use crate::app::routes::common::{csv_download, parse_id};
use crate::app::services::AppServices;
use crate::authz::require_admin;
use crate::context::{OrgContext, PrincipalContext};

const ORDER: &str = "Order";
const ORDER_EXISTS: &str = "Order ID already exists";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/export/download", get(export_orders))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/status", patch(update_status))
}

fn order_filter(org_id: OrgId, query: &ListQuery) -> Filter {
    Filter::org(org_id)
        .search(query.search.as_deref())
        .eq_opt("status", query.status.as_deref())
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    let page = services
        .stores
        .orders
        .list(&order_filter(org.org_id(), &query), query.page_request())
        .await?;
    Ok(Json(ListResponse::from(page)).into_response())
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<OrderInput>,
) -> ApiResult {
    require_admin(&principal)?;
    let valid = body.validate()?;

    let orders = &services.stores.orders;
    let now = time::now();
    let order_id = match valid.order_id.clone() {
        Some(order_id) => order_id,
        None => generate_order_id(now.timestamp_millis(), orders.count(&Filter::org(org.org_id())).await?),
    };

    if orders
        .find_one(&Filter::org(org.org_id()).eq("orderId", &order_id))
        .await?
        .is_some()
    {
        return Err(ApiError::bad_request(ORDER_EXISTS));
    }

    let order = Order::create(org.org_id(), valid, order_id, Some(creator(&principal)), now);
    orders.insert(&order).await.map_err(on_duplicate(ORDER_EXISTS))?;

    tracing::info!(order_id = %order.order_id, status = %order.status, "order created");
    Ok((StatusCode::CREATED, Json(json!({ "order": order }))).into_response())
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let order = load(&services, org.org_id(), &id).await?;
    Ok(Json(json!({ "order": order })).into_response())
}

pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<OrderInput>,
) -> ApiResult {
    require_admin(&principal)?;
    let valid = body.validate()?;
    let mut order = load(&services, org.org_id(), &id).await?;

    if let Some(order_id) = valid.order_id.as_deref().filter(|o| *o != order.order_id) {
        let taken = Filter::org(org.org_id()).eq("orderId", order_id).exclude(order.id);
        if services.stores.orders.find_one(&taken).await?.is_some() {
            return Err(ApiError::bad_request(ORDER_EXISTS));
        }
    }

    let previous = order.status;
    order.apply_update(valid, time::now());
    save(&services, &order).await?;

    if order.status != previous {
        notify_creator(&services, &order).await;
    }
    Ok(Json(json!({ "order": order })).into_response())
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<StatusChangeRequest>,
) -> ApiResult {
    require_admin(&principal)?;
    let status = parse_status_change(body.status.as_ref().and_then(|s| s.as_str()))?;
    let mut order = load(&services, org.org_id(), &id).await?;

    order.transition(status, time::now());
    save(&services, &order).await?;

    tracing::info!(order_id = %order.order_id, status = %status, "order status changed");
    notify_creator(&services, &order).await;
    Ok(Json(json!({ "order": order })).into_response())
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    require_admin(&principal)?;
    let id = parse_id(&id, ORDER)?;
    let order = services
        .stores
        .orders
        .delete(org.org_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(ORDER))?;

    Ok(Json(json!({ "message": "Order deleted successfully", "order": order })).into_response())
}

pub async fn export_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<ListQuery>,
) -> ApiResult {
    require_admin(&principal)?;
    let orders = services
        .stores
        .orders
        .find_all(&order_filter(org.org_id(), &query))
        .await?;
    csv_download("orders-export.csv", &EXPORT_FIELDS, orders.iter().map(Order::export_row))
}

async fn load(services: &AppServices, org_id: OrgId, raw_id: &str) -> Result<Order, ApiError> {
    let id = parse_id(raw_id, ORDER)?;
    services
        .stores
        .orders
        .get(org_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found(ORDER))
}

async fn save(services: &AppServices, order: &Order) -> Result<(), ApiError> {
    let found = services
        .stores
        .orders
        .replace(order)
        .await
        .map_err(on_duplicate(ORDER_EXISTS))?;
    if !found {
        return Err(ApiError::not_found(ORDER));
    }
    Ok(())
}

fn creator(principal: &PrincipalContext) -> OrderCreator {
    let user = principal.user();
    OrderCreator {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    }
}

/// Tell the order's creator about its new stage. Best effort: the status
/// change itself has already been stored.
async fn notify_creator(services: &AppServices, order: &Order) {
    let Some(created_by) = &order.created_by else {
        return;
    };
    let notification =
        Notification::order_status_changed(order.org_id, created_by.id, &order.order_id, order.status.as_str());
    if let Err(e) = services.stores.notifications.insert(&notification).await {
        tracing::warn!(error = %e, order_id = %order.order_id, "failed to store order notification");
    }
}
