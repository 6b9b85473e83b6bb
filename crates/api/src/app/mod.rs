//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the shared service graph (config, stores, token service)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and the JSON extractor
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use itrax_infra::Stores;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(config: AppConfig, stores: Stores) -> Router {
    let cors = cors_layer(&config.client_url);
    let services = Arc::new(services::AppServices::new(config, stores));

    let auth_state = middleware::AuthState {
        tokens: Arc::new(services.tokens.clone()),
        users: services.stores.users.clone(),
    };

    // `route_layer` keeps unknown paths a plain 404 instead of a 401.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = Router::new()
        .nest("/auth", routes::auth::public_router())
        .merge(protected);

    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(Extension(services)),
        )
}

/// Credentialed CORS for the single browser client.
fn cors_layer(client_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match HeaderValue::from_str(client_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!(client_url, error = %e, "invalid CLIENT_URL; cross-origin requests will be refused");
            layer
        }
    }
}
