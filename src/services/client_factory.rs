//! Request-scoped storage clients.
//!
//! A [`ClientFactory`] turns one [`OwnedBucket`] into one [`StorageClient`].
//! Credentials, region and endpoint come only from the bucket record; nothing
//! here reads process-wide provider configuration, and nothing is cached.

use crate::models::bucket::OwnedBucket;
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region},
    error::DisplayErrorContext,
};
use axum::http::Uri;
use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use std::io;
use thiserror::Error;
use tokio_util::io::ReaderStream;

/// Provider call failed. Carries the provider's description for logs only.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(String);

impl ProviderError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// The bucket record cannot be turned into a client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("bucket {0} has an empty region")]
    EmptyRegion(i64),
    #[error("bucket {bucket_id} has an invalid endpoint `{endpoint}`")]
    InvalidEndpoint { bucket_id: i64, endpoint: String },
}

/// One page of a delimited listing.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub common_prefixes: Vec<String>,
    pub next_continuation_token: Option<String>,
}

/// An object body plus the metadata the provider reported with it.
///
/// The provider connection lives inside `stream`; dropping the stream
/// releases it.
pub struct ObjectBody {
    pub stream: BoxStream<'static, io::Result<Bytes>>,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
}

/// Provider calls available to the lister and the streamer.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, ProviderError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, ProviderError>;
}

/// Builds a fresh client for each request from a verified bucket record.
pub trait ClientFactory: Send + Sync {
    fn build(&self, bucket: &OwnedBucket) -> Result<Box<dyn StorageClient>, ConfigError>;
}

/// Factory for S3-compatible providers backed by `aws-sdk-s3`.
#[derive(Debug, Clone, Default)]
pub struct S3ClientFactory;

impl S3ClientFactory {
    /// Assemble the SDK configuration for one bucket. No network I/O.
    pub fn config_for(bucket: &OwnedBucket) -> Result<aws_sdk_s3::Config, ConfigError> {
        if bucket.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion(bucket.bucket_id));
        }

        let credentials = Credentials::new(
            bucket.access_key_id.clone(),
            bucket.secret_access_key.clone(),
            None,
            None,
            "bucket-record",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(bucket.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = custom_endpoint(bucket)? {
            // Custom providers (MinIO, Ceph, ...) rarely support virtual-host addressing.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(builder.build())
    }
}

impl ClientFactory for S3ClientFactory {
    fn build(&self, bucket: &OwnedBucket) -> Result<Box<dyn StorageClient>, ConfigError> {
        let config = Self::config_for(bucket)?;
        Ok(Box::new(S3StorageClient {
            client: Client::from_conf(config),
        }))
    }
}

/// Non-empty endpoint override, validated as an absolute http(s) URL.
fn custom_endpoint(bucket: &OwnedBucket) -> Result<Option<&str>, ConfigError> {
    let Some(endpoint) = bucket
        .endpoint
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
    else {
        return Ok(None);
    };

    let valid = endpoint.parse::<Uri>().is_ok_and(|uri| {
        matches!(uri.scheme_str(), Some("http" | "https")) && uri.authority().is_some()
    });
    if !valid {
        return Err(ConfigError::InvalidEndpoint {
            bucket_id: bucket.bucket_id,
            endpoint: endpoint.to_string(),
        });
    }

    Ok(Some(endpoint))
}

/// [`StorageClient`] over an `aws_sdk_s3::Client` scoped to one bucket's credentials.
pub struct S3StorageClient {
    client: Client,
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, ProviderError> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .delimiter(delimiter)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|err| ProviderError::new(DisplayErrorContext(&err).to_string()))?;

        let next_continuation_token = if resp.is_truncated().unwrap_or(false) {
            resp.next_continuation_token().map(String::from)
        } else {
            None
        };

        Ok(ListPage {
            keys: resp
                .contents()
                .iter()
                .filter_map(|obj| obj.key().map(String::from))
                .collect(),
            common_prefixes: resp
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(String::from))
                .collect(),
            next_continuation_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, ProviderError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| ProviderError::new(DisplayErrorContext(&err).to_string()))?;

        let content_type = resp.content_type().map(String::from);
        let content_length = resp.content_length();
        let stream = ReaderStream::new(resp.body.into_async_read()).boxed();

        Ok(ObjectBody {
            stream,
            content_type,
            content_length,
        })
    }
}
