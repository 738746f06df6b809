//! Unauthenticated status probe.

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppContext;

/// Liveness probe next to the RPC endpoint. Reveals nothing beyond the
/// server version and the advertised endpoint URL.
pub async fn status(State(ctx): State<AppContext>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "message": "MCP server is running",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoint": ctx.settings.endpoint_url(),
        })),
    )
}
