use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, patch},
};
use serde_json::json;

use itrax_core::PageRequest;
use itrax_infra::Filter;
use itrax_notifications::FEED_SIZE;

use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::common::parse_id;
use crate::app::services::AppServices;
use crate::context::{OrgContext, PrincipalContext};

const NOTIFICATION: &str = "Notification";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:id/read", patch(mark_read))
}

/// The caller's most recent notifications, newest first.
pub async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    let filter = Filter::org(org.org_id()).eq("userId", principal.user_id().to_string());
    let page = services
        .stores
        .notifications
        .list(&filter, PageRequest::new(1, FEED_SIZE))
        .await?;
    Ok(Json(json!({ "data": page.items })).into_response())
}

/// Someone else's notification is reported as missing.
pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(org): Extension<OrgContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = parse_id(&id, NOTIFICATION)?;
    let notifications = &services.stores.notifications;
    let mut notification = notifications
        .get(org.org_id(), id)
        .await?
        .filter(|n| n.user_id == principal.user_id())
        .ok_or_else(|| ApiError::not_found(NOTIFICATION))?;

    if !notification.read {
        notification.mark_read();
        notifications.replace(&notification).await?;
    }
    Ok(Json(json!({ "ok": true })).into_response())
}
