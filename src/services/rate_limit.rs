//! Sliding-window rate limiting.
//!
//! The window is a trailing 3600 seconds recomputed at every check against
//! the request log, not a fixed bucket, so there is no burst-at-boundary
//! artifact. The check runs before the current request is logged, so a
//! request never counts against itself. Because the count and the later log
//! insert are not transactionally coupled, concurrent bursts can overshoot
//! the limit by at most the number of in-flight requests; this is an
//! accepted soft limit.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::McpError;
use crate::store::RequestLogStore;

/// Admission control against a key's hourly request budget.
#[derive(Clone)]
pub struct RateLimiter {
    log: Arc<dyn RequestLogStore>,
}

impl RateLimiter {
    pub fn new(log: Arc<dyn RequestLogStore>) -> Self {
        Self { log }
    }

    /// Returns true iff the key has made strictly fewer than
    /// `limit_per_hour` requests in the trailing hour. A limit of zero (or
    /// less) always denies.
    pub async fn allow(&self, api_key_id: i64, limit_per_hour: i32) -> Result<bool, McpError> {
        if limit_per_hour <= 0 {
            return Ok(false);
        }

        let since = Utc::now() - Duration::hours(1);
        let count = self.log.count_since(api_key_id, since).await?;
        Ok(count < i64::from(limit_per_hour))
    }
}
