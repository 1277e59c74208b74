//! Multi-tenant gateway for user-registered S3-compatible buckets.
//!
//! Users register buckets together with the credentials needed to reach
//! them; the gateway then lists and streams objects from those buckets on
//! their behalf, building a storage client from the stored credentials for
//! every request.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use sqlx::SqlitePool;

pub use state::AppState;

/// Apply the embedded migrations to `db`.
pub async fn run_migrations(db: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(db).await
}

/// Router with all routes bound to `state`.
pub fn build_app(state: AppState) -> Router {
    routes::routes::routes().with_state(state)
}
