//! Behavior of the bearer-token admin surface.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use mcp_content_server::config::ApiSettings;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{rpc_call, server_with, split, TestServer};

const ADMIN_TOKEN: &str = "operator-secret";

fn admin_server() -> TestServer {
    server_with(ApiSettings {
        admin_token: Some(ADMIN_TOKEN.to_string()),
        ..ApiSettings::default()
    })
}

async fn admin_request(
    srv: &TestServer,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request build");

    let response = srv.app.clone().oneshot(request).await.expect("router call");
    split(response).await
}

#[tokio::test]
async fn admin_routes_reject_missing_and_wrong_tokens() {
    let srv = admin_server();

    let (status, _) = admin_request(&srv, "GET", "/api/v1/admin/keys", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        admin_request(&srv, "GET", "/api/v1/admin/keys", Some("wrong"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!(1001));
}

#[tokio::test]
async fn unconfigured_admin_surface_is_closed() {
    let srv = server_with(ApiSettings::default());
    let (status, _) =
        admin_request(&srv, "GET", "/api/v1/admin/keys", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn created_keys_work_against_the_rpc_endpoint() {
    let srv = admin_server();

    let (status, body) = admin_request(
        &srv,
        "POST",
        "/api/v1/admin/keys",
        Some(ADMIN_TOKEN),
        Some(json!({"name": "ci"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = body["api_key"].as_str().expect("token").to_string();
    assert!(token.starts_with("mcp_"));
    // Default rate limit applies when the request names none.
    assert_eq!(body["rate_limit"], json!(100));

    srv.store.define_type("post", "Posts", "", false);
    let (status, _) = rpc_call(
        &srv,
        Some(&token),
        json!({"jsonrpc": "2.0", "method": "get_post_types", "params": {}, "id": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn create_requires_a_name() {
    let srv = admin_server();
    let (status, body) = admin_request(
        &srv,
        "POST",
        "/api/v1/admin/keys",
        Some(ADMIN_TOKEN),
        Some(json!({"name": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!(2002));
}

#[tokio::test]
async fn listing_shows_metadata_but_never_tokens() {
    let srv = admin_server();
    let (_, created) = admin_request(
        &srv,
        "POST",
        "/api/v1/admin/keys",
        Some(ADMIN_TOKEN),
        Some(json!({"name": "reader", "rate_limit": 25})),
    )
    .await;
    let token = created["api_key"].as_str().unwrap();

    let (status, body) =
        admin_request(&srv, "GET", "/api/v1/admin/keys", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    let keys = body["keys"].as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["name"], json!("reader"));
    assert_eq!(keys[0]["rate_limit"], json!(25));
    assert!(!body.to_string().contains(token));
}

#[tokio::test]
async fn revocation_cuts_off_the_key_immediately() {
    let srv = admin_server();
    let (_, created) = admin_request(
        &srv,
        "POST",
        "/api/v1/admin/keys",
        Some(ADMIN_TOKEN),
        Some(json!({"name": "doomed"})),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let token = created["api_key"].as_str().unwrap().to_string();

    let (status, body) = admin_request(
        &srv,
        "DELETE",
        &format!("/api/v1/admin/keys/{id}"),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revoked"], json!(true));

    let (status, body) = rpc_call(
        &srv,
        Some(&token),
        json!({"jsonrpc": "2.0", "method": "get_posts", "params": {}, "id": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!(1001));

    // A second revocation finds nothing.
    let (status, _) = admin_request(
        &srv,
        "DELETE",
        &format!("/api/v1/admin/keys/{id}"),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn usage_report_counts_logged_requests() {
    let srv = admin_server();
    srv.store.define_type("post", "Posts", "", false);
    let (_, created) = admin_request(
        &srv,
        "POST",
        "/api/v1/admin/keys",
        Some(ADMIN_TOKEN),
        Some(json!({"name": "busy"})),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    let token = created["api_key"].as_str().unwrap().to_string();

    for _ in 0..3 {
        rpc_call(
            &srv,
            Some(&token),
            json!({"jsonrpc": "2.0", "method": "get_post_types", "params": {}, "id": 1}),
        )
        .await;
    }

    let (status, body) = admin_request(
        &srv,
        "GET",
        &format!("/api/v1/admin/keys/{id}/usage?days=7"),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], json!(3));
    assert_eq!(body["days"], json!(7));
    assert_eq!(body["usage"][0]["requests"], json!(3));

    let (status, _) = admin_request(
        &srv,
        "GET",
        &format!("/api/v1/admin/keys/{id}/usage?days=400"),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
