//! HTTP handlers. Each module maps one resource onto the services layer.

pub mod bucket_handlers;
pub mod file_handlers;
pub mod health_handlers;

use crate::errors::AppError;

/// Parse a `bucket_id` query or path parameter.
pub(crate) fn parse_bucket_id(raw: Option<&str>) -> Result<i64, AppError> {
    let raw = raw.ok_or_else(|| AppError::InvalidRequest("bucket_id is required".into()))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidRequest("Invalid bucket_id".into()))
}
