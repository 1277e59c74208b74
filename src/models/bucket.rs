//! A registered bucket: one tenant's binding to a remote S3-compatible bucket.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::{fmt, ops::Deref};

/// Region used when a registration omits one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// A bucket record as stored in the `buckets` table.
///
/// The secret access key is skipped during serialization and redacted in
/// `Debug`, so neither API responses nor log lines can carry it.
#[derive(Serialize, Clone, FromRow)]
pub struct Bucket {
    /// Server-generated identifier.
    pub bucket_id: i64,

    /// Owning user.
    pub user_id: i64,

    /// Name of the remote bucket, unique per owner.
    pub bucket_name: String,

    pub access_key_id: String,

    #[serde(skip_serializing)]
    pub secret_access_key: String,

    /// Region passed verbatim to the provider client (e.g. "eu-central-1").
    pub region: String,

    /// Custom endpoint for non-AWS providers (MinIO, R2, ...).
    pub endpoint: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("bucket_id", &self.bucket_id)
            .field("user_id", &self.user_id)
            .field("bucket_name", &self.bucket_name)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// A bucket loaded through an ownership-filtered lookup.
///
/// Only the credential store can construct one, and storage clients can only
/// be built from one, so a client is never assembled from a row that was not
/// checked against the caller.
#[derive(Debug, Clone)]
pub struct OwnedBucket(Bucket);

impl OwnedBucket {
    pub(crate) fn verified(bucket: Bucket) -> Self {
        Self(bucket)
    }
}

impl Deref for OwnedBucket {
    type Target = Bucket;

    fn deref(&self) -> &Bucket {
        &self.0
    }
}

/// Input for registering a bucket.
#[derive(Debug, Clone, Default)]
pub struct NewBucket {
    pub bucket_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl NewBucket {
    /// Region to persist, falling back to [`DEFAULT_REGION`].
    pub fn region_or_default(&self) -> &str {
        match self.region.as_deref().map(str::trim) {
            Some(region) if !region.is_empty() => region,
            _ => DEFAULT_REGION,
        }
    }

    /// Endpoint to persist; blank strings are treated as absent.
    pub fn endpoint_or_none(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }

    /// Name of the first mandatory field that is empty, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("bucket_name", &self.bucket_name),
            ("access_key_id", &self.access_key_id),
            ("secret_access_key", &self.secret_access_key),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bucket {
        let now = Utc::now();
        Bucket {
            bucket_id: 7,
            user_id: 1,
            bucket_name: "b1".into(),
            access_key_id: "AK".into(),
            secret_access_key: "super-secret".into(),
            region: DEFAULT_REGION.into(),
            endpoint: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn secret_is_never_serialized_or_debugged() {
        let bucket = sample();
        let json = serde_json::to_value(&bucket).unwrap();
        assert!(json.get("secret_access_key").is_none());
        assert_eq!(json["access_key_id"], "AK");
        assert!(!format!("{:?}", bucket).contains("super-secret"));
        assert!(!format!("{:?}", OwnedBucket::verified(bucket)).contains("super-secret"));
    }

    #[test]
    fn new_bucket_defaults() {
        let req = NewBucket {
            bucket_name: "b1".into(),
            access_key_id: "AK".into(),
            secret_access_key: "SK".into(),
            region: Some("  ".into()),
            endpoint: Some(String::new()),
        };
        assert_eq!(req.region_or_default(), "us-east-1");
        assert_eq!(req.endpoint_or_none(), None);
        assert_eq!(req.missing_field(), None);
    }

    #[test]
    fn first_missing_field_is_reported() {
        let req = NewBucket {
            bucket_name: "b1".into(),
            secret_access_key: "SK".into(),
            ..Default::default()
        };
        assert_eq!(req.missing_field(), Some("access_key_id"));
    }
}
