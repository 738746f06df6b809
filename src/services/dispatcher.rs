//! JSON-RPC request dispatch pipeline.
//!
//! One pass per inbound call: parse envelope, authenticate, check the rate
//! limit, run the method handler, write the request log entry, and frame the
//! response. Any step can exit straight to an error envelope; there are no
//! retries. Authentication and rate-limit failures short-circuit before any
//! handler runs, and only dispatched requests are logged.

use std::net::IpAddr;
use std::time::Instant;

use axum::http::StatusCode;
use serde_json::Value;

use crate::error::McpError;
use crate::models::request_log::NewLogEntry;
use crate::models::rpc::{RpcRequest, RpcResponse};
use crate::handlers;
use crate::state::AppContext;

/// Endpoint name recorded in request log entries.
pub const ENDPOINT: &str = "mcp";

/// Explicit request context threaded into the pipeline. Everything a
/// component needs is here; nothing is read from ambient state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub http_method: String,
    pub client_ip: IpAddr,
    pub user_agent: Option<String>,
    /// Raw value of the `X-API-Key` header, if present.
    pub api_key: Option<String>,
}

/// The closed method table. Adding a capability means adding a variant here
/// and a handler arm in [`run_method`]; there is no dynamic discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GetPosts,
    GetPost,
    GetPages,
    GetPage,
    GetPostTypes,
    SearchContent,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get_posts" => Some(Self::GetPosts),
            "get_post" => Some(Self::GetPost),
            "get_pages" => Some(Self::GetPages),
            "get_page" => Some(Self::GetPage),
            "get_post_types" => Some(Self::GetPostTypes),
            "search_content" => Some(Self::SearchContent),
            _ => None,
        }
    }
}

/// Process one JSON-RPC request body end to end.
///
/// Always returns a full response envelope with the HTTP status derived
/// from the outcome, so the client contract stays uniform even for
/// pre-dispatch failures.
pub async fn dispatch(
    ctx: &AppContext,
    body: &[u8],
    request: &RequestContext,
) -> (StatusCode, RpcResponse) {
    let started = Instant::now();

    let envelope = match RpcRequest::parse(body) {
        Ok(envelope) => envelope,
        Err((err, id)) => return respond_err(&err, id),
    };

    if ctx.settings.debug_mode {
        tracing::debug!(method = %envelope.method, ip = %request.client_ip, "dispatching");
    }

    // Authenticate. A missing header gets the same domain code as a bad key,
    // wrapped in a full envelope rather than a bare HTTP error.
    let token = match request.api_key.as_deref() {
        Some(token) => token,
        None => {
            return respond_err(
                &McpError::InvalidApiKey("API key required".to_string()),
                envelope.id,
            );
        }
    };
    let key = match ctx.keys.validate(token).await {
        Ok(key) => key,
        Err(err) => return respond_err(&err, envelope.id),
    };

    // Admission control; the current request is not yet logged, so it does
    // not count against itself.
    match ctx.limiter.allow(key.id, key.rate_limit).await {
        Ok(true) => {}
        Ok(false) => return respond_err(&McpError::RateLimitExceeded, envelope.id),
        Err(err) => return respond_err(&err, envelope.id),
    }

    let (status, response) = match run_method(ctx, &envelope).await {
        Ok(result) => (
            StatusCode::OK,
            RpcResponse::success(result, envelope.id.clone()),
        ),
        Err(err) => {
            if matches!(err, McpError::Internal | McpError::Store(_)) {
                tracing::error!(method = %envelope.method, error = %err, "method handler failed");
            }
            respond_err(&err, envelope.id.clone())
        }
    };

    if ctx.settings.security_logging {
        let entry = NewLogEntry {
            api_key_id: key.id,
            endpoint: ENDPOINT.to_string(),
            method: request.http_method.clone(),
            ip_address: request.client_ip.to_string(),
            user_agent: request.user_agent.clone(),
            request_data: serde_json::to_string(&envelope.params).ok(),
            response_code: status.as_u16() as i32,
            response_time: started.elapsed().as_secs_f64(),
        };
        // Best-effort: a failed log write never blocks the response.
        if let Err(err) = ctx.logs.append(entry).await {
            tracing::warn!(key_id = key.id, error = %err, "failed to write request log entry");
        }
    }

    (status, response)
}

fn respond_err(err: &McpError, id: Value) -> (StatusCode, RpcResponse) {
    (err.http_status(), RpcResponse::failure(err, id))
}

/// Resolve the method name and run its handler with typed parameters.
async fn run_method(ctx: &AppContext, envelope: &RpcRequest) -> Result<Value, McpError> {
    let method = Method::from_name(&envelope.method).ok_or(McpError::MethodNotFound)?;
    let params = envelope.params.clone();

    match method {
        Method::GetPosts => handlers::posts::get_posts(ctx, parse_params(params)?).await,
        Method::GetPost => handlers::posts::get_post(ctx, parse_params(params)?).await,
        Method::GetPages => handlers::pages::get_pages(ctx, parse_params(params)?).await,
        Method::GetPage => handlers::pages::get_page(ctx, parse_params(params)?).await,
        Method::GetPostTypes => {
            handlers::post_types::get_post_types(ctx, parse_params(params)?).await
        }
        Method::SearchContent => handlers::search::search_content(ctx, parse_params(params)?).await,
    }
}

/// Deserialize the open params object into a method's parameter struct.
fn parse_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, McpError> {
    serde_json::from_value(params)
        .map_err(|err| McpError::InvalidParameter(format!("Invalid parameter values: {err}")))
}
