//! Request handlers.
//!
//! `rpc`, `status`, and `admin` are axum endpoints. The remaining modules
//! are the JSON-RPC method handlers invoked by the dispatcher; each owns its
//! parameter struct and validates inputs before touching the content
//! repository.

pub mod admin;
pub mod pages;
pub mod post_types;
pub mod posts;
pub mod rpc;
pub mod search;
pub mod status;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::McpError;
use crate::models::content::ContentFilters;

/// Default page size when the client does not ask for one.
pub const DEFAULT_LIMIT: i64 = 10;

/// Words used for derived excerpts.
pub const EXCERPT_WORDS: usize = 55;

/// Wire shape of the optional `filters` parameter shared by listing and
/// search methods. Dates are RFC 3339 strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFilters {
    pub date_after: Option<String>,
    pub date_before: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl RawFilters {
    /// Parse into repository filters; a malformed date is an invalid
    /// parameter value.
    pub fn resolve(self) -> Result<ContentFilters, McpError> {
        Ok(ContentFilters {
            date_after: self.date_after.as_deref().map(parse_date).transpose()?,
            date_before: self.date_before.as_deref().map(parse_date).transpose()?,
            author: self.author,
            category: self.category,
            tag: self.tag,
        })
    }
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, McpError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| McpError::InvalidParameter(format!("Invalid date value: {raw}")))
}

/// Clamp a requested page size to `max`, rejecting negatives.
pub fn clamp_limit(requested: Option<i64>, max: i64) -> Result<i64, McpError> {
    let limit = requested.unwrap_or(DEFAULT_LIMIT);
    if limit < 0 {
        return Err(McpError::InvalidParameter(
            "limit must not be negative".to_string(),
        ));
    }
    Ok(limit.min(max))
}

/// Validate a requested offset, rejecting negatives.
pub fn check_offset(requested: Option<i64>) -> Result<i64, McpError> {
    let offset = requested.unwrap_or(0);
    if offset < 0 {
        return Err(McpError::InvalidParameter(
            "offset must not be negative".to_string(),
        ));
    }
    Ok(offset)
}
