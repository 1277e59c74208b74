//! Object streamer: fetches one object and describes how to send it.
//!
//! The body is handed back as a stream that owns the provider connection, so
//! the bytes are never buffered whole and the connection is released whenever
//! the stream is dropped (finished, failed, or abandoned by a disconnecting
//! client).

use crate::services::client_factory::{ProviderError, StorageClient};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream::BoxStream};
use std::{borrow::Cow, io};
use tracing::{error, warn};

pub const FALLBACK_FILENAME: &str = "file";
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Everything a handler needs to answer a download.
pub struct ObjectDownload {
    pub stream: BoxStream<'static, io::Result<Bytes>>,
    pub content_type: String,
    pub content_length: Option<i64>,
    pub filename: String,
}

impl ObjectDownload {
    /// `Content-Disposition` value for this download.
    pub fn content_disposition(&self) -> String {
        content_disposition(&self.filename)
    }
}

/// Percent-decode a raw path parameter into an object key.
///
/// Decoding is best effort: malformed input is used as-is.
pub fn decode_key(raw: &str) -> Cow<'_, str> {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded,
        Err(err) => {
            warn!(path = raw, error = %err, "failed to decode object path; using raw value");
            Cow::Borrowed(raw)
        }
    }
}

/// Trailing path segment of `key`, or [`FALLBACK_FILENAME`].
pub fn filename_for(key: &str) -> &str {
    match key.rsplit('/').next() {
        Some(name) if !name.is_empty() => name,
        _ => FALLBACK_FILENAME,
    }
}

/// Provider type if present, else a guess from the extension, else octet-stream.
pub fn resolve_content_type(reported: Option<&str>, filename: &str) -> String {
    if let Some(reported) = reported.map(str::trim).filter(|t| !t.is_empty()) {
        return reported.to_string();
    }
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// `attachment` disposition carrying both filename forms.
///
/// The quoted form is restricted to printable ASCII for old clients; the
/// `filename*` form carries the exact UTF-8 name, percent-encoded.
pub fn content_disposition(filename: &str) -> String {
    let mut plain = String::with_capacity(filename.len());
    for c in filename.chars() {
        match c {
            '"' | '\\' => {
                plain.push('\\');
                plain.push(c);
            }
            ' '..='~' => plain.push(c),
            _ => plain.push('_'),
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        plain,
        urlencoding::encode(filename)
    )
}

/// Fetch `key` from `bucket`.
///
/// Any provider failure, including a missing object, comes back as an error;
/// callers report it as not found.
pub async fn fetch(
    client: &dyn StorageClient,
    bucket: &str,
    key: &str,
) -> Result<ObjectDownload, ProviderError> {
    let object = client.get_object(bucket, key).await?;

    let filename = filename_for(key).to_string();
    let content_type = resolve_content_type(object.content_type.as_deref(), &filename);

    let bucket_name = bucket.to_string();
    let object_key = key.to_string();
    let stream = object
        .stream
        .inspect_err(move |err| {
            error!(bucket = %bucket_name, key = %object_key, error = %err, "failed to stream object");
        })
        .boxed();

    Ok(ObjectDownload {
        stream,
        content_type,
        content_length: object.content_length,
        filename,
    })
}
