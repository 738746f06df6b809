//! Error types and the protocol/domain error code taxonomy.
//!
//! Two code spaces coexist on the wire:
//!
//! - JSON-RPC reserved protocol codes (-32700 parse error, -32600 invalid
//!   request, -32601 method not found)
//! - Application domain codes, grouped by thousands: 1000s auth, 2000s
//!   request validation, 3000s content, 5000s server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Protocol-level JSON-RPC error codes (reserved range).
pub const CODE_PARSE_ERROR: i32 = -32700;
pub const CODE_INVALID_REQUEST: i32 = -32600;
pub const CODE_METHOD_NOT_FOUND: i32 = -32601;

/// Domain error codes.
pub const CODE_INVALID_API_KEY: i32 = 1001;
pub const CODE_RATE_LIMIT_EXCEEDED: i32 = 1002;
pub const CODE_INSUFFICIENT_PERMISSIONS: i32 = 1003;
pub const CODE_INVALID_REQUEST_FORMAT: i32 = 2001;
pub const CODE_MISSING_PARAMETER: i32 = 2002;
pub const CODE_INVALID_PARAMETER: i32 = 2003;
pub const CODE_NOT_FOUND: i32 = 3001;
pub const CODE_ACCESS_DENIED: i32 = 3002;
pub const CODE_INTERNAL_ERROR: i32 = 5001;
pub const CODE_DATABASE_ERROR: i32 = 5002;

/// Application-wide error type.
///
/// Every failure a request can produce maps to exactly one variant, and every
/// variant maps to one numeric code and one HTTP status. Handlers return
/// these through `Result` so expected failures (missing parameter, not found)
/// are values the dispatcher is forced to handle; only `Internal` and
/// `Store` represent genuinely unexpected trouble.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Request body was not well-formed JSON.
    #[error("Parse error")]
    ParseError,

    /// Envelope missing the `"2.0"` version tag or a string method name.
    #[error("Invalid Request")]
    InvalidRequest,

    /// Method name is not in the fixed method table.
    #[error("Method not found")]
    MethodNotFound,

    /// API key is missing, malformed, revoked, or unknown.
    #[error("{0}")]
    InvalidApiKey(String),

    /// The key exhausted its trailing-hour request budget.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// A required method parameter was not supplied.
    #[error("{0}")]
    MissingParameter(String),

    /// A parameter was supplied but its value is unusable.
    #[error("{0}")]
    InvalidParameter(String),

    /// Content does not exist or is not publicly visible. Both cases
    /// collapse here so clients cannot probe for hidden items.
    #[error("{0}")]
    NotFound(String),

    /// Request refused by policy (API disabled).
    #[error("Content access denied")]
    AccessDenied,

    /// Catch-all for unexpected failures. The client only ever sees the
    /// fixed message; detail goes to tracing.
    #[error("Internal server error")]
    Internal,

    /// Persistence layer failure.
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl McpError {
    /// Numeric wire code for this error.
    pub fn code(&self) -> i32 {
        match self {
            McpError::ParseError => CODE_PARSE_ERROR,
            McpError::InvalidRequest => CODE_INVALID_REQUEST,
            McpError::MethodNotFound => CODE_METHOD_NOT_FOUND,
            McpError::InvalidApiKey(_) => CODE_INVALID_API_KEY,
            McpError::RateLimitExceeded => CODE_RATE_LIMIT_EXCEEDED,
            McpError::MissingParameter(_) => CODE_MISSING_PARAMETER,
            McpError::InvalidParameter(_) => CODE_INVALID_PARAMETER,
            McpError::NotFound(_) => CODE_NOT_FOUND,
            McpError::AccessDenied => CODE_ACCESS_DENIED,
            McpError::Internal => CODE_INTERNAL_ERROR,
            McpError::Store(_) => CODE_DATABASE_ERROR,
        }
    }

    /// Message safe to show to the client.
    ///
    /// Server-side failures are flattened to fixed strings so internal
    /// detail (connection strings, SQL) never leaks into a response.
    pub fn client_message(&self) -> String {
        match self {
            McpError::Internal => "Internal server error".to_string(),
            McpError::Store(_) => "Database connection error".to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status for a response carrying this error.
    pub fn http_status(&self) -> StatusCode {
        http_status_for_code(self.code())
    }
}

/// Fixed mapping from wire error code to HTTP status.
///
/// Protocol-level JSON-RPC codes and unknown codes fall through to 400.
pub fn http_status_for_code(code: i32) -> StatusCode {
    match code {
        CODE_INVALID_API_KEY | CODE_INSUFFICIENT_PERMISSIONS => StatusCode::UNAUTHORIZED,
        CODE_RATE_LIMIT_EXCEEDED => StatusCode::TOO_MANY_REQUESTS,
        CODE_INVALID_REQUEST_FORMAT | CODE_MISSING_PARAMETER | CODE_INVALID_PARAMETER => {
            StatusCode::BAD_REQUEST
        }
        CODE_NOT_FOUND => StatusCode::NOT_FOUND,
        CODE_ACCESS_DENIED => StatusCode::FORBIDDEN,
        CODE_INTERNAL_ERROR | CODE_DATABASE_ERROR => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Convert McpError into a plain HTTP error response.
///
/// This is used by the administrative routes only. The JSON-RPC endpoint
/// builds full protocol envelopes itself and never goes through here.
impl IntoResponse for McpError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.client_message()
            }
        }));

        (status, body).into_response()
    }
}
