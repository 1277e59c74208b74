//! Defines routes for the gateway API.
//!
//! ## Structure
//! - **Probes** (unauthenticated, mounted at root)
//!   - `GET    /healthz`, `GET /readyz`
//!
//! - **Bucket registry** (`/api/v1`)
//!   - `GET    /buckets` — list the caller's buckets
//!   - `POST   /buckets` — register a bucket
//!   - `DELETE /buckets/{bucket_id}` — remove a registration
//!
//! - **Objects** (`/api/v1`)
//!   - `GET    /files?bucket_id=&path=` — list one directory level
//!   - `GET    /files/{*path}?bucket_id=` — download an object
//!
//! The wildcard `*path` allows nested keys like `photos/2025/img.jpg`. It
//! never matches an empty tail, so `/files/` has its own route answering 400.

use crate::{
    handlers::{
        bucket_handlers::{create_bucket, delete_bucket, list_buckets},
        file_handlers::{download_file, download_without_path, list_files},
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::Request,
    routing::{delete, get},
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Build the router for all gateway routes.
///
/// Authentication is enforced per handler through the `AuthUser` extractor,
/// so every `/api/v1` route answers 401 before touching the store.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .route("/buckets", get(list_buckets).post(create_bucket))
        .route("/buckets/{bucket_id}", delete(delete_bucket))
        .route("/files", get(list_files))
        .route("/files/", get(download_without_path))
        .route("/files/{*path}", get(download_file));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::info_span!(
                "request",
                method = %req.method(),
                path = %req.uri().path(),
                request_id = %Uuid::new_v4(),
            )
        }))
}
