//! Shared harness for router-level tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use mcp_content_server::config::ApiSettings;
use mcp_content_server::models::content::ContentItem;
use mcp_content_server::server::build_router;
use mcp_content_server::state::AppContext;
use mcp_content_server::store::memory::MemoryStore;

pub struct TestServer {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub ctx: AppContext,
}

pub fn server_with(settings: ApiSettings) -> TestServer {
    let store = Arc::new(MemoryStore::new());
    let ctx = AppContext::new(settings, store.clone(), store.clone(), store.clone());
    let app = build_router(ctx.clone())
        .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 9], 4000))));
    TestServer { app, store, ctx }
}

pub fn server() -> TestServer {
    server_with(ApiSettings::default())
}

/// Seed a published item with a creation time offset in hours for stable
/// ordering assertions.
pub fn published(id: i64, content_type: &str, title: &str, slug: &str) -> ContentItem {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + chrono::Duration::hours(id);
    ContentItem {
        id,
        content_type: content_type.to_string(),
        title: title.to_string(),
        slug: slug.to_string(),
        status: "published".to_string(),
        author: "alice".to_string(),
        excerpt: None,
        body: format!("Body of {title}."),
        parent_id: None,
        menu_order: 0,
        created_at: created,
        updated_at: created,
    }
}

pub async fn issue_key(server: &TestServer) -> String {
    server
        .ctx
        .keys
        .generate("tests", None, 100)
        .await
        .expect("key generation")
        .api_key
}

pub async fn rpc_call(
    server: &TestServer,
    api_key: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/v1/mcp")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        request = request.header("x-api-key", key);
    }
    let request = request
        .body(Body::from(body.to_string()))
        .expect("request build");

    let response = server
        .app
        .clone()
        .oneshot(request)
        .await
        .expect("router call");
    split(response).await
}

pub async fn split(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
