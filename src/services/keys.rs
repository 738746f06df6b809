//! API key issuance and validation.
//!
//! Secret tokens are `mcp_` followed by 56 hex characters (28 random bytes,
//! 224 bits of entropy). Only the SHA-256 hash is persisted; the plain token
//! exists in exactly one place, the `GeneratedKey` returned at creation.

use std::sync::Arc;

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::McpError;
use crate::models::api_key::{ApiKey, ApiKeyMeta, GeneratedKey, NewApiKey};
use crate::store::KeyStore;

/// Fixed prefix making keys visually identifiable and cheaply pre-filterable.
pub const KEY_PREFIX: &str = "mcp_";

const KEY_RANDOM_BYTES: usize = 28;
const KEY_LENGTH: usize = KEY_PREFIX.len() + KEY_RANDOM_BYTES * 2;

/// Key management facade over the [`KeyStore`].
#[derive(Clone)]
pub struct KeyService {
    store: Arc<dyn KeyStore>,
}

impl KeyService {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self { store }
    }

    /// Create a new active key with a freshly generated secret token.
    ///
    /// The returned [`GeneratedKey`] is the only copy of the token; it is
    /// not retrievable afterwards.
    pub async fn generate(
        &self,
        name: &str,
        permissions: Option<serde_json::Value>,
        rate_limit: i32,
    ) -> Result<GeneratedKey, McpError> {
        let token = new_token();
        let id = self
            .store
            .insert(NewApiKey {
                key_hash: hash_token(&token),
                name: name.to_string(),
                permissions: permissions.unwrap_or_else(|| serde_json::json!([])),
                rate_limit,
            })
            .await?;

        tracing::info!(key_id = id, name, "generated api key");

        Ok(GeneratedKey {
            id,
            api_key: token,
            name: name.to_string(),
        })
    }

    /// Look up an active key by its secret token.
    ///
    /// On success the last-used timestamp is updated best-effort; a failed
    /// update never fails the validation.
    pub async fn validate(&self, token: &str) -> Result<ApiKey, McpError> {
        if !looks_like_key(token) {
            return Err(invalid_key());
        }

        let key = self
            .store
            .find_active_by_hash(&hash_token(token))
            .await?
            .ok_or_else(invalid_key)?;

        if let Err(err) = self.store.touch_last_used(key.id).await {
            tracing::warn!(key_id = key.id, error = %err, "failed to update last-used timestamp");
        }

        Ok(key)
    }

    /// Deactivate a key. Returns whether a row was affected; an unknown id
    /// is not an error.
    pub async fn revoke(&self, id: i64) -> Result<bool, McpError> {
        let revoked = self.store.deactivate(id).await?;
        if revoked {
            tracing::info!(key_id = id, "revoked api key");
        }
        Ok(revoked)
    }

    /// Key metadata, newest first. Never includes token material.
    pub async fn list(&self) -> Result<Vec<ApiKeyMeta>, McpError> {
        Ok(self.store.list().await?)
    }
}

fn invalid_key() -> McpError {
    McpError::InvalidApiKey("Invalid or inactive API key".to_string())
}

/// Cheap format check before any hashing or lookup.
pub fn looks_like_key(token: &str) -> bool {
    token.len() == KEY_LENGTH
        && token.starts_with(KEY_PREFIX)
        && token[KEY_PREFIX.len()..]
            .bytes()
            .all(|b| b.is_ascii_hexdigit())
}

fn new_token() -> String {
    let mut bytes = [0u8; KEY_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn service() -> KeyService {
        KeyService::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn tokens_have_the_documented_format() {
        let token = new_token();
        assert!(looks_like_key(&token));
        assert_eq!(token.len(), 60);
        assert!(token.starts_with("mcp_"));
    }

    #[test]
    fn format_prefilter_rejects_garbage() {
        assert!(!looks_like_key(""));
        assert!(!looks_like_key("mcp_short"));
        assert!(!looks_like_key(&format!("key_{}", "a".repeat(56))));
        assert!(!looks_like_key(&format!("mcp_{}", "z".repeat(56))));
    }

    #[tokio::test]
    async fn generated_tokens_are_unique_and_validate() {
        let svc = service();
        let a = svc.generate("first", None, 100).await.unwrap();
        let b = svc.generate("second", None, 100).await.unwrap();
        assert_ne!(a.api_key, b.api_key);

        let key = svc.validate(&a.api_key).await.unwrap();
        assert_eq!(key.id, a.id);
        assert_eq!(key.name, "first");
        assert!(key.last_used_at.is_some());
    }

    #[tokio::test]
    async fn listing_never_exposes_the_token() {
        let svc = service();
        let generated = svc.generate("probe", None, 50).await.unwrap();

        let listed = svc.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        let serialized = serde_json::to_string(&listed).unwrap();
        assert!(!serialized.contains(&generated.api_key));
        assert_eq!(listed[0].rate_limit, 50);
    }

    #[tokio::test]
    async fn revoked_keys_fail_validation() {
        let svc = service();
        let generated = svc.generate("doomed", None, 100).await.unwrap();
        assert!(svc.validate(&generated.api_key).await.is_ok());

        assert!(svc.revoke(generated.id).await.unwrap());
        let err = svc.validate(&generated.api_key).await.unwrap_err();
        assert_eq!(err.code(), crate::error::CODE_INVALID_API_KEY);

        // Revoking an unknown id reports no row affected, not an error.
        assert!(!svc.revoke(9999).await.unwrap());
    }
}
