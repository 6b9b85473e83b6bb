use axum::{Router, routing::get};

pub mod admin;
pub mod assets;
pub mod auth;
pub mod categories;
pub mod common;
pub mod inventory;
pub mod licenses;
pub mod locations;
pub mod notifications;
pub mod orders;
pub mod reports;
pub mod system;

/// Router for all authenticated (org-scoped) endpoints, mounted under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .nest("/orders", orders::router())
        .nest("/assets", assets::router())
        .nest("/categories", categories::router())
        .nest("/locations", locations::router())
        .nest("/licenses", licenses::router())
        .nest("/inventory", inventory::router())
        .nest("/admin", admin::router())
        .nest("/reports", reports::router())
        .nest("/notifications", notifications::router())
}
