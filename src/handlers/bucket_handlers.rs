//! HTTP handlers for bucket registration.

use crate::{
    auth::AuthUser,
    errors::AppError,
    handlers::parse_bucket_id,
    models::bucket::{Bucket, NewBucket},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Body of `POST /buckets`.
#[derive(Debug, Deserialize)]
pub struct CreateBucketReq {
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl From<CreateBucketReq> for NewBucket {
    fn from(req: CreateBucketReq) -> Self {
        NewBucket {
            bucket_name: req.bucket_name,
            access_key_id: req.access_key_id,
            secret_access_key: req.secret_access_key,
            region: req.region,
            endpoint: req.endpoint,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateBucketResp {
    pub bucket_id: i64,
    pub bucket_name: String,
}

#[derive(Debug, Serialize)]
pub struct ListBucketsResp {
    pub buckets: Vec<Bucket>,
}

/// `GET /buckets` — the caller's buckets, newest first, without secrets.
pub async fn list_buckets(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ListBucketsResp>, AppError> {
    let buckets = state.store.list(user.user_id).await?;
    Ok(Json(ListBucketsResp { buckets }))
}

/// `POST /buckets` — register a bucket with its provider credentials.
pub async fn create_bucket(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateBucketReq>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected bucket registration body");
        AppError::Validation("Invalid request body".into())
    })?;

    let new_bucket = NewBucket::from(req);
    if let Some(field) = new_bucket.missing_field() {
        return Err(AppError::Validation(format!("{field} is required")));
    }

    let bucket_id = state.store.create(user.user_id, &new_bucket).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBucketResp {
            bucket_id,
            bucket_name: new_bucket.bucket_name,
        }),
    ))
}

/// `DELETE /buckets/{bucket_id}` — drop one of the caller's registrations.
pub async fn delete_bucket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(bucket_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let bucket_id = parse_bucket_id(Some(&bucket_id))?;
    state.store.delete(user.user_id, bucket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
