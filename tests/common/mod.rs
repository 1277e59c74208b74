#![allow(dead_code)]
//! Shared fixtures: an in-memory SQLite store, a token gate, and a fake
//! S3-compatible provider that honours credentials, delimiters and paging.

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request};
use bytes::Bytes;
use chrono::{Duration, Utc};
use futures::{StreamExt, stream};
use jsonwebtoken::{EncodingKey, Header, encode};
use sqlx::sqlite::SqlitePoolOptions;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    io,
    pin::Pin,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
};
use web_s3_gateway::{
    AppState,
    auth::{Claims, JwtGate},
    build_app, run_migrations,
    models::bucket::OwnedBucket,
    services::{
        client_factory::{
            ClientFactory, ConfigError, ListPage, ObjectBody, ProviderError, StorageClient,
        },
        credential_store::CredentialStore,
    },
};

pub const SECRET: &str = "test-secret";

pub async fn store() -> CredentialStore {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    CredentialStore::new(Arc::new(pool))
}

pub async fn app(provider: &FakeProvider) -> Router {
    let state = AppState::new(
        store().await,
        Arc::new(provider.clone()),
        Arc::new(JwtGate::new(SECRET)),
    );
    build_app(state)
}

pub fn token(user_id: i64) -> String {
    let claims = Claims {
        user_id,
        username: None,
        exp: (Utc::now() + Duration::hours(1)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn get(uri: &str, user_id: i64) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token(user_id)))
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, user_id: i64, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token(user_id)))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[derive(Clone)]
pub struct FakeObject {
    /// Body chunks; an `Err` fails the stream at that point.
    pub chunks: Vec<Result<Bytes, String>>,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
}

impl FakeObject {
    pub fn text(body: &str) -> Self {
        Self {
            chunks: vec![Ok(Bytes::copy_from_slice(body.as_bytes()))],
            content_type: None,
            content_length: Some(body.len() as i64),
        }
    }

    pub fn with_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Two good chunks followed by a read failure.
    pub fn broken() -> Self {
        Self {
            chunks: vec![
                Ok(Bytes::from_static(b"part-1 ")),
                Ok(Bytes::from_static(b"part-2 ")),
                Err("connection reset".into()),
            ],
            content_type: None,
            content_length: Some(100),
        }
    }
}

/// Remote buckets keyed by (access key id, bucket name): a client built from
/// the wrong credentials sees nothing.
#[derive(Clone, Default)]
pub struct FakeProvider {
    buckets: Arc<Mutex<HashMap<(String, String), BTreeMap<String, FakeObject>>>>,
    page_size: Option<usize>,
    fail_listing: bool,
    /// Bucket ids clients were built for, in order.
    pub built_for: Arc<Mutex<Vec<i64>>>,
    /// Set when the last streamed body was dropped.
    pub released: Arc<AtomicBool>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paged(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub fn failing_listing() -> Self {
        Self {
            fail_listing: true,
            ..Self::default()
        }
    }

    pub fn put(&self, access_key: &str, bucket: &str, key: &str, object: FakeObject) {
        self.buckets
            .lock()
            .unwrap()
            .entry((access_key.into(), bucket.into()))
            .or_default()
            .insert(key.into(), object);
    }

    pub fn builds(&self) -> Vec<i64> {
        self.built_for.lock().unwrap().clone()
    }
}

impl ClientFactory for FakeProvider {
    fn build(&self, bucket: &OwnedBucket) -> Result<Box<dyn StorageClient>, ConfigError> {
        self.built_for.lock().unwrap().push(bucket.bucket_id);
        Ok(Box::new(FakeClient {
            access_key: bucket.access_key_id.clone(),
            provider: self.clone(),
        }))
    }
}

pub struct FakeClient {
    access_key: String,
    provider: FakeProvider,
}

impl FakeClient {
    fn objects(&self, bucket: &str) -> Result<BTreeMap<String, FakeObject>, ProviderError> {
        self.provider
            .buckets
            .lock()
            .unwrap()
            .get(&(self.access_key.clone(), bucket.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::new("NoSuchBucket: internal detail"))
    }
}

#[async_trait]
impl StorageClient for FakeClient {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, ProviderError> {
        if self.provider.fail_listing {
            return Err(ProviderError::new("SlowDown: internal detail"));
        }
        let objects = self.objects(bucket)?;

        // Entries in key order: (is_prefix, value).
        let mut seen_prefixes = BTreeSet::new();
        let mut entries = Vec::new();
        for key in objects.keys().filter(|k| k.starts_with(prefix)) {
            let rest = &key[prefix.len()..];
            match rest.find(delimiter) {
                Some(pos) => {
                    let common = format!("{}{}", prefix, &rest[..pos + delimiter.len()]);
                    if seen_prefixes.insert(common.clone()) {
                        entries.push((true, common));
                    }
                }
                None => entries.push((false, key.clone())),
            }
        }

        let start = continuation_token
            .map(|t| t.parse::<usize>().unwrap())
            .unwrap_or(0);
        let end = match self.provider.page_size {
            Some(size) => (start + size).min(entries.len()),
            None => entries.len(),
        };

        let mut page = ListPage::default();
        for (is_prefix, value) in &entries[start..end] {
            if *is_prefix {
                page.common_prefixes.push(value.clone());
            } else {
                page.keys.push(value.clone());
            }
        }
        if end < entries.len() {
            page.next_continuation_token = Some(end.to_string());
        }
        Ok(page)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody, ProviderError> {
        let object = self
            .objects(bucket)?
            .remove(key)
            .ok_or_else(|| ProviderError::new("NoSuchKey: internal detail"))?;

        let released = self.provider.released.clone();
        released.store(false, Ordering::SeqCst);
        Ok(ObjectBody {
            stream: ReleaseOnDrop {
                inner: stream::iter(
                    object
                        .chunks
                        .into_iter()
                        .map(|chunk| chunk.map_err(io::Error::other)),
                )
                .boxed(),
                released,
            }
            .boxed(),
            content_type: object.content_type,
            content_length: object.content_length,
        })
    }
}

/// Stream wrapper that flags when the provider body is released.
struct ReleaseOnDrop {
    inner: futures::stream::BoxStream<'static, io::Result<Bytes>>,
    released: Arc<AtomicBool>,
}

impl futures::Stream for ReleaseOnDrop {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
