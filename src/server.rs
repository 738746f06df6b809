//! Router assembly and the serve loop.

use std::net::SocketAddr;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, rpc, status};
use crate::state::AppContext;

/// Build the application router.
///
/// The RPC endpoint and the status probe are public; the key-management
/// routes are fenced by the admin bearer-token middleware.
pub fn build_router(ctx: AppContext) -> Router {
    let admin_routes = Router::new()
        .route("/api/v1/admin/keys", post(admin::create_key).get(admin::list_keys))
        .route("/api/v1/admin/keys/{id}", axum::routing::delete(admin::revoke_key))
        .route("/api/v1/admin/keys/{id}/usage", get(admin::key_usage))
        .route_layer(middleware::from_fn_with_state(
            ctx.clone(),
            crate::middleware::admin::require_admin,
        ));

    Router::new()
        .route("/api/v1/mcp", post(rpc::handle_mcp))
        .route("/api/v1/mcp/status", get(status::status))
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Bind and serve until the process is stopped.
pub async fn serve(ctx: AppContext, port: u16) -> anyhow::Result<()> {
    let router = build_router(ctx);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
