//! Request log model.
//!
//! One append-only entry per dispatched request. Entries feed the sliding
//! window rate limiter and the admin usage statistics; they are never
//! mutated after insert.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Insert payload for a request log entry.
///
/// `api_key_id` is always the authenticated key: logging happens after
/// authentication and admission, so there is no anonymous entry.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub api_key_id: i64,
    pub endpoint: String,
    pub method: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    /// Serialized copy of the inbound JSON-RPC params.
    pub request_data: Option<String>,
    pub response_code: i32,
    /// End-to-end latency in fractional seconds.
    pub response_time: f64,
}

/// One day of request volume for a key, newest-first in listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub requests: i64,
}
