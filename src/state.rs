//! Application context shared by all requests.
//!
//! One [`AppContext`] is constructed at process start and injected into the
//! router; there is no global singleton. It bundles the configuration
//! snapshot with the three storage interfaces behind `Arc`s, so cloning is
//! cheap and every component's inputs are explicit.

use std::sync::Arc;

use crate::config::ApiSettings;
use crate::db::DbPool;
use crate::services::keys::KeyService;
use crate::services::rate_limit::RateLimiter;
use crate::store::postgres::PgStore;
use crate::store::{ContentRepository, KeyStore, RequestLogStore};

#[derive(Clone)]
pub struct AppContext {
    pub settings: ApiSettings,
    pub keys: KeyService,
    pub limiter: RateLimiter,
    pub logs: Arc<dyn RequestLogStore>,
    pub content: Arc<dyn ContentRepository>,
}

impl AppContext {
    pub fn new(
        settings: ApiSettings,
        keys: Arc<dyn KeyStore>,
        logs: Arc<dyn RequestLogStore>,
        content: Arc<dyn ContentRepository>,
    ) -> Self {
        Self {
            settings,
            keys: KeyService::new(keys),
            limiter: RateLimiter::new(logs.clone()),
            logs,
            content,
        }
    }

    /// Production wiring: all three interfaces backed by one Postgres store.
    pub fn postgres(pool: DbPool, settings: ApiSettings) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::new(settings, store.clone(), store.clone(), store)
    }
}
