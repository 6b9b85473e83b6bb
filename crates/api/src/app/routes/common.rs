use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use itrax_core::RecordId;
use itrax_reports::encode_csv;

use crate::app::errors::{ApiError, ApiResult};

/// Path id of a record; a malformed id cannot name anything, so it is a 404.
pub fn parse_id(raw: &str, what: &str) -> Result<RecordId, ApiError> {
    raw.parse().map_err(|_| ApiError::not_found(what))
}

/// CSV attachment for `/export/download` routes.
pub fn csv_download<I>(filename: &str, columns: &[&str], rows: I) -> ApiResult
where
    I: IntoIterator<Item = Vec<String>>,
{
    let body = encode_csv(columns, rows)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename={filename}")),
        ],
        body,
    )
        .into_response())
}
