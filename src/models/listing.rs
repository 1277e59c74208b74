//! Result of listing one "directory" level of a remote bucket.

use serde::Serialize;

/// Immediate children of a prefix.
///
/// `files` holds full object keys found directly under the prefix,
/// `directories` holds common prefixes (each ending in `/`). Both keep the
/// order the provider returned them in.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingResult {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}
