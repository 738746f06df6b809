//! Administrative key-management endpoints.
//!
//! Plain REST, not JSON-RPC: these routes sit behind the admin bearer-token
//! middleware and return `McpError` directly as HTTP error bodies. The
//! create response is the only place a plain token ever leaves the server.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::McpError;
use crate::state::AppContext;

/// Default window for the usage report, in days.
const DEFAULT_USAGE_DAYS: i64 = 7;
const MAX_USAGE_DAYS: i64 = 90;

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Option<Value>,
    #[serde(default)]
    pub rate_limit: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UsageQuery {
    pub days: Option<i64>,
}

/// `POST /api/v1/admin/keys`
pub async fn create_key(
    State(ctx): State<AppContext>,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<Value>), McpError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(McpError::MissingParameter(
            "name parameter required".to_string(),
        ));
    }

    let rate_limit = match request.rate_limit {
        Some(limit) if limit <= 0 => {
            return Err(McpError::InvalidParameter(
                "rate_limit must be positive".to_string(),
            ));
        }
        Some(limit) => limit,
        None => ctx.settings.default_rate_limit,
    };

    let generated = ctx.keys.generate(name, request.permissions, rate_limit).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": generated.id,
            "name": generated.name,
            "api_key": generated.api_key,
            "rate_limit": rate_limit,
        })),
    ))
}

/// `GET /api/v1/admin/keys`
pub async fn list_keys(State(ctx): State<AppContext>) -> Result<Json<Value>, McpError> {
    let keys = ctx.keys.list().await?;
    Ok(Json(json!({ "keys": keys })))
}

/// `DELETE /api/v1/admin/keys/{id}`
pub async fn revoke_key(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, McpError> {
    let revoked = ctx.keys.revoke(id).await?;
    if !revoked {
        return Err(McpError::NotFound("API key not found".to_string()));
    }
    Ok(Json(json!({ "revoked": true, "id": id })))
}

/// `GET /api/v1/admin/keys/{id}/usage`
///
/// Per-day request counts over the trailing window, newest day first.
pub async fn key_usage(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    Query(query): Query<UsageQuery>,
) -> Result<Json<Value>, McpError> {
    let days = query.days.unwrap_or(DEFAULT_USAGE_DAYS);
    if !(1..=MAX_USAGE_DAYS).contains(&days) {
        return Err(McpError::InvalidParameter(format!(
            "days must be between 1 and {MAX_USAGE_DAYS}"
        )));
    }

    let since = Utc::now() - Duration::days(days);
    let usage = ctx.logs.usage_by_day(id, since).await?;
    let total: i64 = usage.iter().map(|day| day.requests).sum();

    Ok(Json(json!({
        "key_id": id,
        "days": days,
        "total_requests": total,
        "usage": usage,
    })))
}
