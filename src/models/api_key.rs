//! API key model for authentication.
//!
//! Keys are long-lived credentials handed to automated clients. Only the
//! SHA-256 hash of the secret token is stored; the token itself is rendered
//! exactly once, in the [`GeneratedKey`] returned at creation time, and no
//! read path can recover it afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents an API key record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table:
/// - `id`: stable integer identifier (request logs reference it)
/// - `key_hash`: SHA-256 hash of the secret token (64 hex characters)
/// - `name`: human-readable label
/// - `permissions`: reserved structured permission set, currently unused
/// - `rate_limit`: requests per rolling hour
/// - `created_at` / `last_used_at` / `is_active`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    pub id: i64,

    /// SHA-256 hash of the secret token. Lookup happens by hashing the
    /// presented token and matching this column exactly.
    pub key_hash: String,

    pub name: String,

    /// Reserved for future scoped permissions; stored but never evaluated.
    pub permissions: serde_json::Value,

    /// Requests allowed per trailing 3600-second window. Zero denies
    /// everything.
    pub rate_limit: i32,

    pub created_at: DateTime<Utc>,

    /// Updated best-effort on successful validation.
    pub last_used_at: Option<DateTime<Utc>>,

    /// Revocation flips this to false; rows are never deleted because logs
    /// reference them by id.
    pub is_active: bool,
}

/// Key metadata exposed by list/admin endpoints. The token hash is
/// deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKeyMeta {
    pub id: i64,
    pub name: String,
    pub rate_limit: i32,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// Result of generating a key. The only place the secret token ever appears.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKey {
    pub id: i64,
    pub api_key: String,
    pub name: String,
}

/// Insert payload for a new key.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub key_hash: String,
    pub name: String,
    pub permissions: serde_json::Value,
    pub rate_limit: i32,
}
