//! HTTP handlers for browsing and downloading objects in a registered bucket.
//!
//! Both handlers follow the same order: resolve the caller, load the bucket
//! through the ownership-filtered store lookup, then build a storage client
//! from that record for this request only.

use crate::{
    auth::AuthUser,
    errors::AppError,
    handlers::parse_bucket_id,
    models::listing::ListingResult,
    services::{lister, streamer},
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Query, RawPathParams, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
pub struct FilesQuery {
    pub bucket_id: Option<String>,
    pub path: Option<String>,
}

/// Unwrap the query string, reporting a malformed one as a 400 error body.
fn files_query(query: Result<Query<FilesQuery>, QueryRejection>) -> Result<FilesQuery, AppError> {
    query.map(|Query(q)| q).map_err(|rejection| {
        warn!(error = %rejection, "rejected files query string");
        AppError::InvalidRequest("Invalid query parameters".into())
    })
}

/// `GET /files?bucket_id=&path=` — immediate children of `path`.
pub async fn list_files(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<FilesQuery>, QueryRejection>,
) -> Result<Json<ListingResult>, AppError> {
    let q = files_query(query)?;
    let bucket_id = parse_bucket_id(q.bucket_id.as_deref())?;
    let bucket = state.store.get_by_id(user.user_id, bucket_id).await?;
    let client = state.clients.build(&bucket)?;

    let listing = lister::list_children(
        client.as_ref(),
        &bucket.bucket_name,
        q.path.as_deref().unwrap_or(""),
    )
    .await?;

    Ok(Json(listing))
}

/// `GET /files/{*path}?bucket_id=` — stream one object to the caller.
pub async fn download_file(
    State(state): State<AppState>,
    user: AuthUser,
    params: RawPathParams,
    query: Result<Query<FilesQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let raw_path = params
        .iter()
        .find_map(|(name, value)| (name == "path").then_some(value))
        .unwrap_or_default();
    let raw_path = raw_path.strip_prefix('/').unwrap_or(raw_path);
    if raw_path.is_empty() {
        return Err(AppError::InvalidRequest("File path is required".into()));
    }
    let key = streamer::decode_key(raw_path);

    let q = files_query(query)?;
    let bucket_id = parse_bucket_id(q.bucket_id.as_deref())?;
    let bucket = state.store.get_by_id(user.user_id, bucket_id).await?;
    let client = state.clients.build(&bucket)?;

    debug!(bucket = %bucket.bucket_name, key = %key, "downloading object");
    let download = streamer::fetch(client.as_ref(), &bucket.bucket_name, &key)
        .await
        .map_err(|err| {
            warn!(bucket = %bucket.bucket_name, key = %key, error = %err, "object fetch failed");
            AppError::NotFound("File not found")
        })?;

    let disposition = download.content_disposition();
    let mut response = Response::new(Body::from_stream(download.stream));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&download.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(streamer::FALLBACK_CONTENT_TYPE)),
    );
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(length) = download.content_length.filter(|len| *len >= 0) {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

/// `GET /files/` — a download with no object key.
pub async fn download_without_path(_user: AuthUser) -> AppError {
    AppError::InvalidRequest("File path is required".into())
}
