use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use itrax_auth::{AuthzError, PasswordError};
use itrax_core::{DomainError, FieldErrors};
use itrax_infra::StoreError;
use itrax_reports::CsvError;

pub type ApiResult<T = Response> = Result<T, ApiError>;

/// Every failure a handler can return.
///
/// Bodies always carry `error` (machine code) and `message` (human text);
/// field validation failures add `errors: {field: message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// `"<what> not found"`.
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Validation(_) => "validation_error",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "error": "validation_error",
                    "message": "Validation error",
                    "errors": errors,
                })),
            )
                .into_response(),
            other => json_error(other.status(), other.code(), other.to_string()),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map a unique-key collision to a 400 with a resource-specific message.
pub fn on_duplicate(message: &'static str) -> impl Fn(StoreError) -> ApiError {
    move |err| match err {
        StoreError::Duplicate { .. } => ApiError::bad_request(message),
        other => other.into(),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Fields(errors) => ApiError::Validation(errors),
            DomainError::NotFound(what) => ApiError::not_found(what),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => ApiError::BadRequest(format!("{field} already exists")),
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "store failure");
                ApiError::Internal("Server error".to_string())
            }
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(_: AuthzError) -> Self {
        ApiError::forbidden("Forbidden")
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!(error = %err, "password hashing failed");
        ApiError::Internal("Server error".to_string())
    }
}

impl From<CsvError> for ApiError {
    fn from(err: CsvError) -> Self {
        tracing::error!(error = %err, "csv export failed");
        ApiError::Internal("Server error".to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_http_statuses() {
        let mut fields = FieldErrors::new();
        fields.add("assetName", "Asset name is required");

        assert_eq!(ApiError::from(DomainError::Fields(fields)).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(DomainError::not_found("Order")).to_string(), "Order not found");
        assert_eq!(
            ApiError::from(DomainError::not_found("Order")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DomainError::validation("Invalid status")).to_string(),
            "Invalid status"
        );
    }

    #[test]
    fn store_errors_split_into_client_and_server_faults() {
        let dup = on_duplicate("Order ID already exists")(StoreError::Duplicate { field: "orderId".into() });
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
        assert_eq!(dup.to_string(), "Order ID already exists");

        let backend = ApiError::from(StoreError::backend("connection reset"));
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(backend.to_string(), "Server error");
    }
}
