//! Data models for the gateway.
//!
//! `bucket` maps to the `buckets` table via `sqlx::FromRow`; `listing` is a
//! transient value returned by the object lister and serialized as JSON.

pub mod bucket;
pub mod listing;
