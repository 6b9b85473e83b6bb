use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use itrax_core::{Page, PageRequest};

use crate::app::errors::ApiError;

// -------------------------
// Extractors
// -------------------------

/// `axum::Json` whose rejections use the API error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

// -------------------------
// Request DTOs
// -------------------------

/// Query string shared by list, export and report endpoints.
///
/// Numbers stay strings so junk input falls back to defaults instead of
/// failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub report_id: Option<String>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.limit.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `PATCH /orders/:id/status`; anything but one of the six stage
/// names is rejected.
#[derive(Debug, Default, Deserialize)]
pub struct StatusChangeRequest {
    pub status: Option<Value>,
}

// -------------------------
// Response envelopes
// -------------------------

/// `{data, total, page, limit, totalPages}` (orders, employees).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> From<Page<T>> for ListResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total_pages: page.total_pages(),
            total: page.total,
            page: page.request.page(),
            limit: page.request.limit(),
            data: page.items,
        }
    }
}

/// `{data, pagination: {page, limit, total, pages}}` (catalogue resources).
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            pagination: Pagination {
                page: page.request.page(),
                limit: page.request.limit(),
                total: page.total,
                pages: page.total_pages(),
            },
            data: page.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelopes_use_their_documented_shapes() {
        let page = Page::new(vec![1, 2], 12, PageRequest::new(2, 5));

        let flat = serde_json::to_value(ListResponse::from(page.clone())).unwrap();
        assert_eq!(flat["totalPages"], 3);
        assert_eq!(flat["page"], 2);
        assert_eq!(flat["data"], serde_json::json!([1, 2]));

        let nested = serde_json::to_value(PaginatedResponse::from(page)).unwrap();
        assert_eq!(nested["pagination"]["pages"], 3);
        assert_eq!(nested["pagination"]["total"], 12);
        assert_eq!(nested["pagination"]["limit"], 5);
    }

    #[test]
    fn list_query_falls_back_to_defaults() {
        let q = ListQuery {
            page: Some("x".into()),
            limit: Some("1000".into()),
            ..ListQuery::default()
        };
        let req = q.page_request();
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), 100);
    }
}
