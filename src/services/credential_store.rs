//! src/services/credential_store.rs
//!
//! CredentialStore — persists registered buckets and their provider
//! credentials in SQLite. Every read is filtered by owner, so a bucket that
//! belongs to someone else is indistinguishable from one that does not exist.

use crate::models::bucket::{Bucket, NewBucket, OwnedBucket};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Absent, or owned by another user.
    #[error("bucket not found")]
    BucketNotFound,
    #[error("bucket name already exists for this owner")]
    BucketAlreadyExists,
    #[error("`{0}` is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

const BUCKET_COLUMNS: &str = "bucket_id, user_id, bucket_name, access_key_id, secret_access_key, \
     region, endpoint, created_at, updated_at";

/// Bucket registry backed by the shared SQLite pool.
#[derive(Clone)]
pub struct CredentialStore {
    pub db: Arc<SqlitePool>,
}

impl CredentialStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// All buckets owned by `user_id`, newest first. Empty when none.
    pub async fn list(&self, user_id: i64) -> StoreResult<Vec<Bucket>> {
        let buckets = sqlx::query_as::<_, Bucket>(&format!(
            "SELECT {BUCKET_COLUMNS} FROM buckets
             WHERE user_id = ?
             ORDER BY created_at DESC, bucket_id DESC"
        ))
        .bind(user_id)
        .fetch_all(&*self.db)
        .await?;

        Ok(buckets)
    }

    /// Fetch a bucket only if `user_id` owns it.
    pub async fn get_by_id(&self, user_id: i64, bucket_id: i64) -> StoreResult<OwnedBucket> {
        sqlx::query_as::<_, Bucket>(&format!(
            "SELECT {BUCKET_COLUMNS} FROM buckets WHERE bucket_id = ? AND user_id = ?"
        ))
        .bind(bucket_id)
        .bind(user_id)
        .fetch_optional(&*self.db)
        .await?
        .map(OwnedBucket::verified)
        .ok_or(StoreError::BucketNotFound)
    }

    /// Register a bucket and return its new identifier.
    ///
    /// Mandatory fields are checked before the database is touched. A second
    /// registration of the same name by the same owner yields
    /// `BucketAlreadyExists`.
    pub async fn create(&self, user_id: i64, new_bucket: &NewBucket) -> StoreResult<i64> {
        if let Some(field) = new_bucket.missing_field() {
            return Err(StoreError::MissingField(field));
        }

        let now = Utc::now();
        let inserted = sqlx::query_scalar::<_, i64>(
            "INSERT INTO buckets (
                user_id, bucket_name, access_key_id, secret_access_key,
                region, endpoint, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING bucket_id",
        )
        .bind(user_id)
        .bind(&new_bucket.bucket_name)
        .bind(&new_bucket.access_key_id)
        .bind(&new_bucket.secret_access_key)
        .bind(new_bucket.region_or_default())
        .bind(new_bucket.endpoint_or_none())
        .bind(now)
        .bind(now)
        .fetch_one(&*self.db)
        .await;

        match inserted {
            Ok(bucket_id) => {
                debug!(user_id, bucket_id, bucket = %new_bucket.bucket_name, "registered bucket");
                Ok(bucket_id)
            }
            Err(err) if is_unique_violation(&err) => Err(StoreError::BucketAlreadyExists),
            Err(err) => Err(StoreError::Sqlx(err)),
        }
    }

    /// Remove a bucket registration owned by `user_id`.
    pub async fn delete(&self, user_id: i64, bucket_id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM buckets WHERE bucket_id = ? AND user_id = ?")
            .bind(bucket_id)
            .bind(user_id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::BucketNotFound);
        }

        debug!(user_id, bucket_id, "removed bucket registration");
        Ok(())
    }
}

/// True if the database rejected the row because of a UNIQUE constraint.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
