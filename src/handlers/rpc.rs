//! HTTP entry point for the JSON-RPC endpoint.
//!
//! Thin adapter between axum and the dispatch pipeline: it pulls the pieces
//! of request context out of the HTTP layer (client address, API key header,
//! user agent) and frames the dispatcher's response. The kill switch lives
//! here so a disabled API refuses every call before any parsing happens.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;

use crate::error::McpError;
use crate::models::rpc::RpcResponse;
use crate::net;
use crate::services::dispatcher::{self, RequestContext};
use crate::state::AppContext;

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

pub async fn handle_mcp(
    State(ctx): State<AppContext>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !ctx.settings.api_enabled {
        let err = McpError::AccessDenied;
        let response = RpcResponse::failure(&err, Value::Null);
        return (err.http_status(), Json(response)).into_response();
    }

    let request = RequestContext {
        http_method: method.to_string(),
        client_ip: net::resolve_client_ip(&headers, remote.ip()),
        user_agent: header_string(&headers, "user-agent"),
        api_key: header_string(&headers, API_KEY_HEADER),
    };

    let (status, response) = dispatcher::dispatch(&ctx, &body, &request).await;
    (status, Json(response)).into_response()
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
