//! Bearer-token guard for the administrative routes.
//!
//! The admin surface is all-or-nothing: one operator token configured at
//! startup. With no token configured the routes reject everything, so a
//! fresh deployment is closed by default.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::error::McpError;
use crate::state::AppContext;

pub async fn require_admin(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = ctx.settings.admin_token.as_deref() else {
        return unauthorized("Admin interface disabled");
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        // Digests compared instead of the raw strings so length never
        // shortcuts the comparison.
        Some(token) if Sha256::digest(token) == Sha256::digest(expected) => {
            next.run(request).await
        }
        _ => unauthorized("Invalid admin token"),
    }
}

fn unauthorized(message: &str) -> Response {
    McpError::InvalidApiKey(message.to_string()).into_response()
}
