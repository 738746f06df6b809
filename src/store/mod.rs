//! Storage traits and backends.
//!
//! The dispatcher and handlers talk to three narrow interfaces: the key
//! store, the request log, and the read-only content repository. Production
//! binds all three to [`postgres::PgStore`]; tests and local development use
//! [`memory::MemoryStore`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::api_key::{ApiKey, ApiKeyMeta, NewApiKey};
use crate::models::content::{
    ContentItem, ContentPage, ContentQuery, ItemTerm, MetaField, SearchQuery, TypeDescriptor,
};
use crate::models::request_log::{DailyUsage, NewLogEntry};

/// Persistence failure, mapped to the 5002 wire code at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persists API keys and their metadata.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Insert a new active key, returning its id.
    async fn insert(&self, key: NewApiKey) -> Result<i64, StoreError>;

    /// Exact-match lookup of an active key by token hash.
    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError>;

    /// Update the last-used timestamp. Losing this update under a race is
    /// acceptable.
    async fn touch_last_used(&self, id: i64) -> Result<(), StoreError>;

    /// Flip the active flag off. Returns whether a row was affected.
    async fn deactivate(&self, id: i64) -> Result<bool, StoreError>;

    /// All keys, newest first, token hash excluded.
    async fn list(&self) -> Result<Vec<ApiKeyMeta>, StoreError>;
}

/// Append-only log of processed requests.
#[async_trait]
pub trait RequestLogStore: Send + Sync {
    async fn append(&self, entry: NewLogEntry) -> Result<(), StoreError>;

    /// Number of entries for `api_key_id` created strictly after `since`.
    /// Backs the sliding rate-limit window.
    async fn count_since(&self, api_key_id: i64, since: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Per-day request counts since `since`, newest day first.
    async fn usage_by_day(
        &self,
        api_key_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyUsage>, StoreError>;
}

/// Read-only query interface over the external content store.
///
/// The server never mutates content; listings and lookups here are the full
/// extent of its access.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<ContentItem>, StoreError>;

    /// Lookup by slug, optionally constrained to one content type.
    async fn find_by_slug(
        &self,
        slug: &str,
        content_type: Option<&str>,
    ) -> Result<Option<ContentItem>, StoreError>;

    /// Published children of a hierarchical item, in menu order.
    async fn children(&self, parent_id: i64) -> Result<Vec<ContentItem>, StoreError>;

    /// Published items matching the query, plus the unpaginated total.
    async fn list(&self, query: &ContentQuery) -> Result<ContentPage, StoreError>;

    /// Published items whose title or body contains the search text.
    async fn search(&self, query: &SearchQuery) -> Result<ContentPage, StoreError>;

    /// Descriptors for the named types, alphabetical. Unknown names are
    /// silently skipped.
    async fn types(&self, names: &[String]) -> Result<Vec<TypeDescriptor>, StoreError>;

    /// Public custom fields of one item (keys not starting with `_`).
    async fn item_meta(&self, item_id: i64) -> Result<Vec<MetaField>, StoreError>;

    /// Taxonomy terms attached to one item.
    async fn item_terms(&self, item_id: i64) -> Result<Vec<ItemTerm>, StoreError>;
}
