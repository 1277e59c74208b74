//! Object lister: one "directory" level of a remote bucket.

use crate::{
    models::listing::ListingResult,
    services::client_factory::{ProviderError, StorageClient},
};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const DELIMITER: &str = "/";

/// Turn a user-supplied path into a listing prefix.
///
/// Empty means the bucket root; anything else gets a trailing delimiter so
/// `docs` and `docs/` both list the children of `docs/`.
pub fn normalize_prefix(path: &str) -> String {
    if path.is_empty() || path.ends_with(DELIMITER) {
        path.to_string()
    } else {
        format!("{path}{DELIMITER}")
    }
}

/// List the immediate children of `path` in `bucket`.
///
/// Follows continuation tokens until the provider reports no more pages and
/// merges all pages in the order they arrived. A token that was already
/// followed ends the loop, so a provider cycling through tokens cannot keep
/// it running.
pub async fn list_children(
    client: &dyn StorageClient,
    bucket: &str,
    path: &str,
) -> Result<ListingResult, ProviderError> {
    let prefix = normalize_prefix(path);
    let mut result = ListingResult::default();
    let mut token: Option<String> = None;
    let mut seen_tokens: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = client
            .list_page(bucket, &prefix, DELIMITER, token.clone())
            .await?;
        pages += 1;

        result.files.extend(page.keys);
        result.directories.extend(page.common_prefixes);

        match page.next_continuation_token {
            Some(next) if !seen_tokens.insert(next.clone()) => {
                warn!(bucket, prefix = %prefix, pages, "provider repeated a continuation token; stopping");
                break;
            }
            Some(next) => token = Some(next),
            None => break,
        }
    }

    debug!(
        bucket,
        prefix = %prefix,
        pages,
        files = result.files.len(),
        directories = result.directories.len(),
        "listed prefix"
    );
    Ok(result)
}
