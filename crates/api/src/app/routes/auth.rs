//! Signup, login and token refresh.
//!
//! Access tokens travel in the `Authorization` header; the refresh token lives
//! only in an httpOnly cookie scoped to the whole site.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
    routing::post,
};
use serde_json::json;

use itrax_auth::{NewUser, User, UserStatus, normalize_email, signup_role};
use itrax_core::time;
use itrax_infra::Filter;

use crate::app::dto::{JsonBody, LoginRequest, SignupRequest};
use crate::app::errors::{ApiError, ApiResult, on_duplicate};
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::middleware::read_cookie;

pub const REFRESH_COOKIE: &str = "refreshToken";

const USER_EXISTS: &str = "User already exists";
const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_REFRESH: &str = "Invalid refresh token";

/// Routes reachable without a bearer token.
pub fn public_router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> ApiResult {
    let (Some(email), Some(password)) = (non_blank(body.email), body.password.filter(|p| !p.is_empty())) else {
        return Err(ApiError::bad_request("Email and password required"));
    };
    let email = normalize_email(&email);
    let org_id = services.config.default_org_id;
    let users = &services.stores.users;

    if users.find_one(&Filter::org(org_id).eq("email", &email)).await?.is_some() {
        return Err(ApiError::bad_request(USER_EXISTS));
    }

    // The very first account anywhere bootstraps the system as its admin.
    let role = signup_role(users.count(&Filter::default()).await?);
    let password_hash = services.hash_password(&password).await?;

    let user = User::new(NewUser {
        org_id,
        role,
        first_name: body.first_name.unwrap_or_default(),
        last_name: body.last_name.unwrap_or_default(),
        email,
        password_hash,
        phone: String::new(),
        department: String::new(),
        location_id: None,
        status: UserStatus::Active,
    });
    users.insert(&user).await.map_err(on_duplicate(USER_EXISTS))?;

    tracing::info!(user_id = %user.id, org_id = %org_id, role = %role, "user signed up");
    session_response(&services, &user)
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult {
    let (Some(email), Some(password)) = (non_blank(body.email), body.password.filter(|p| !p.is_empty())) else {
        return Err(ApiError::bad_request("Email and password required"));
    };

    let users = &services.stores.users;
    let Some(mut user) = users.find_one(&Filter::default().eq("email", normalize_email(&email))).await? else {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    };
    if !services.verify_password(&password, &user.password_hash).await? {
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }
    if !user.is_active() {
        return Err(ApiError::forbidden("Account is inactive"));
    }

    user.record_login(time::now());
    users.replace(&user).await?;

    session_response(&services, &user)
}

/// Mounted behind the auth middleware.
pub async fn me(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(json!({ "user": principal.user().public() }))
}

pub async fn refresh(Extension(services): Extension<Arc<AppServices>>, headers: HeaderMap) -> ApiResult {
    let token = read_cookie(&headers, REFRESH_COOKIE).ok_or_else(|| ApiError::unauthorized("No refresh token"))?;

    let claims = services
        .tokens
        .verify_refresh(token)
        .map_err(|_| ApiError::unauthorized(INVALID_REFRESH))?;

    let user = services
        .stores
        .users
        .get(claims.org_id, claims.sub)
        .await?
        .filter(User::is_active)
        .ok_or_else(|| ApiError::unauthorized(INVALID_REFRESH))?;

    let token = issue_access(&services, &user)?;
    Ok(Json(json!({ "token": token, "user": user.public() })).into_response())
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>) -> ApiResult {
    let cookie = refresh_cookie("", 0, services.config.production)?;
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({ "ok": true }))).into_response())
}

/// `{token, user}` plus a fresh refresh cookie.
fn session_response(services: &AppServices, user: &User) -> ApiResult {
    let token = issue_access(services, user)?;
    let refresh = services
        .tokens
        .issue_refresh(user.id, user.org_id, user.role)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let cookie = refresh_cookie(
        &refresh,
        services.tokens.refresh_ttl().num_seconds(),
        services.config.production,
    )?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "token": token, "user": user.public() })),
    )
        .into_response())
}

fn issue_access(services: &AppServices, user: &User) -> Result<String, ApiError> {
    services
        .tokens
        .issue_access(user.id, user.org_id, user.role)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// httpOnly, `SameSite=Lax`, `Secure` in production. A max age of zero clears it.
fn refresh_cookie(value: &str, max_age_secs: i64, secure: bool) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!("{REFRESH_COOKIE}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| ApiError::Internal(format!("invalid cookie header: {e}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_cookie_attributes() {
        let dev = refresh_cookie("abc", 604800, false).unwrap();
        let dev = dev.to_str().unwrap();
        assert!(dev.starts_with("refreshToken=abc;"));
        assert!(dev.contains("HttpOnly"));
        assert!(dev.contains("SameSite=Lax"));
        assert!(dev.contains("Max-Age=604800"));
        assert!(!dev.contains("Secure"));

        let prod = refresh_cookie("abc", 604800, true).unwrap();
        assert!(prod.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let cleared = refresh_cookie("", 0, false).unwrap();
        assert!(cleared.to_str().unwrap().starts_with("refreshToken=;"));
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
