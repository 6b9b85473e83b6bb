use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use itrax_auth::{TokenService, User};
use itrax_infra::Repository;

use crate::app::errors::ApiError;
use crate::context::{OrgContext, PrincipalContext};

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn Repository<User>>,
}

/// Verify the bearer token and reload its user.
///
/// The user is read back from the store on every request, so a deleted
/// account stops working immediately and role changes apply at once.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    let claims = state.tokens.verify_access(token).map_err(|e| {
        tracing::debug!(error = %e, "rejected access token");
        ApiError::unauthorized("Invalid token")
    })?;

    let user = state
        .users
        .get(claims.org_id, claims.sub)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    if !user.is_active() {
        return Err(ApiError::forbidden("Account is inactive"));
    }

    req.extensions_mut().insert(OrgContext::new(user.org_id));
    req.extensions_mut().insert(PrincipalContext::new(user));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Value of one cookie from the `Cookie` header.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
