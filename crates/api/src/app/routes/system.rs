use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};
use serde_json::json;

use crate::app::services::AppServices;

pub async fn root() -> impl IntoResponse {
    Json(json!({ "ok": true, "app": "ITraX API" }))
}

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "backend": services.stores.backend() }))
}
