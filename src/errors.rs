//! HTTP-facing error taxonomy.
//!
//! Every failure a handler can produce is one of a small, closed set of
//! variants. `status()` and `code()` are the single mapping table to the
//! transport; nothing downstream inspects error text.

use crate::services::{
    client_factory::{ConfigError, ProviderError},
    credential_store::StoreError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// No authenticated identity on the request.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Malformed query or path parameter.
    #[error("{0}")]
    InvalidRequest(String),

    /// Missing or malformed field in a request body.
    #[error("{0}")]
    Validation(String),

    /// Bucket absent, bucket owned by someone else, or object absent.
    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    AlreadyExists(&'static str),

    /// Persistent store failure. The inner error is logged, never returned.
    #[error("storage fault: {0}")]
    Storage(#[source] sqlx::Error),

    /// Remote provider failure other than a missing object.
    #[error("provider fault: {0}")]
    Provider(#[source] ProviderError),

    /// A storage client could not be assembled from the bucket record.
    #[error("config fault: {0}")]
    Config(#[source] ConfigError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) | AppError::Provider(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code placed in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "unauthorized",
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Validation(_) => "validation_failed",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Storage(_) => "storage_fault",
            AppError::Provider(_) => "provider_fault",
            AppError::Config(_) => "config_fault",
        }
    }

    /// Message safe to show a client. Faults collapse to fixed text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) => "Internal server error".into(),
            AppError::Provider(_) => "Storage provider request failed".into(),
            AppError::Config(_) => "Error creating S3 client".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }

        let body = Json(json!({
            "error": self.public_message(),
            "code": self.code(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BucketNotFound => AppError::NotFound("Bucket not found"),
            StoreError::BucketAlreadyExists => AppError::AlreadyExists("Bucket name already exists"),
            StoreError::MissingField(field) => AppError::Validation(format!("{field} is required")),
            StoreError::Sqlx(err) => AppError::Storage(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err)
    }
}
