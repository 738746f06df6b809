//! End-to-end behavior of the JSON-RPC endpoint through the full router.

mod common;

use axum::http::StatusCode;
use mcp_content_server::config::ApiSettings;
use serde_json::json;

use common::{issue_key, published, rpc_call, server, server_with};

fn envelope(method: &str, params: serde_json::Value) -> serde_json::Value {
    json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": 1 })
}

#[tokio::test]
async fn status_probe_needs_no_authentication() {
    let srv = server();
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/v1/mcp/status")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(srv.app.clone(), request)
        .await
        .unwrap();
    let (status, body) = common::split(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["endpoint"], json!("http://localhost:3000/api/v1/mcp"));
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn malformed_json_yields_parse_error_with_null_id() {
    let srv = server();
    let key = issue_key(&srv).await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/mcp")
        .header("x-api-key", &key)
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(srv.app.clone(), request)
        .await
        .unwrap();
    let (status, body) = common::split(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!(-32700));
    assert_eq!(body["id"], json!(null));
    assert_eq!(body["jsonrpc"], json!("2.0"));
}

#[tokio::test]
async fn missing_api_key_is_rejected_before_dispatch() {
    let srv = server();
    let (status, body) = rpc_call(&srv, None, envelope("get_posts", json!({}))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!(1001));
    assert_eq!(body["id"], json!(1));
}

#[tokio::test]
async fn disabled_api_refuses_everything_with_access_denied() {
    let srv = server_with(ApiSettings {
        api_enabled: false,
        ..ApiSettings::default()
    });
    let key = issue_key(&srv).await;
    let (status, body) = rpc_call(&srv, Some(&key), envelope("get_posts", json!({}))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!(3002));
}

#[tokio::test]
async fn posts_round_trip_with_listing_and_detail() {
    let srv = server();
    srv.store.add_item(published(1, "post", "First post", "first"));
    srv.store.add_item(published(2, "post", "Second post", "second"));
    let key = issue_key(&srv).await;

    let (status, body) = rpc_call(&srv, Some(&key), envelope("get_posts", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let result = &body["result"];
    assert_eq!(result["total"], json!(2));
    // Newest first.
    assert_eq!(result["posts"][0]["slug"], json!("second"));

    let (status, body) = rpc_call(
        &srv,
        Some(&key),
        envelope("get_post", json!({"slug": "first"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let detail = &body["result"];
    assert_eq!(detail["id"], json!(1));
    assert_eq!(detail["content"], json!("Body of First post."));
    assert!(detail["custom_fields"].is_object());
}

#[tokio::test]
async fn pages_expose_hierarchy() {
    let srv = server();
    let mut parent = published(1, "page", "Guide", "guide");
    parent.menu_order = 1;
    srv.store.add_item(parent);
    let mut child = published(2, "page", "Install", "install");
    child.parent_id = Some(1);
    child.menu_order = 1;
    srv.store.add_item(child);
    let key = issue_key(&srv).await;

    let (status, body) = rpc_call(
        &srv,
        Some(&key),
        envelope("get_page", json!({"page_id": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let detail = &body["result"];
    assert_eq!(detail["parent"], json!(null));
    assert_eq!(detail["children"][0]["slug"], json!("install"));

    let (_, body) = rpc_call(
        &srv,
        Some(&key),
        envelope("get_page", json!({"slug": "install"})),
    )
    .await;
    assert_eq!(body["result"]["parent"]["slug"], json!("guide"));
}

#[tokio::test]
async fn search_returns_scored_hits() {
    let srv = server();
    srv.store
        .add_item(published(1, "post", "Rust deployment notes", "deploy"));
    srv.store.add_item(published(2, "page", "About", "about"));
    let key = issue_key(&srv).await;

    let (status, body) = rpc_call(
        &srv,
        Some(&key),
        envelope("search_content", json!({"query": "rust"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let result = &body["result"];
    assert_eq!(result["total"], json!(1));
    assert_eq!(result["query"], json!("rust"));
    assert_eq!(result["results"][0]["slug"], json!("deploy"));
    assert!(result["results"][0]["relevance_score"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn rate_limited_key_receives_429_envelopes() {
    let srv = server();
    srv.store.define_type("post", "Posts", "", false);
    let generated = srv.ctx.keys.generate("tight", None, 2).await.unwrap();
    let payload = envelope("get_post_types", json!({}));

    for _ in 0..2 {
        let (status, _) = rpc_call(&srv, Some(&generated.api_key), payload.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = rpc_call(&srv, Some(&generated.api_key), payload).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], json!(1002));
}

#[tokio::test]
async fn drafts_stay_invisible_through_every_method() {
    let srv = server();
    let mut draft = published(1, "post", "Secret draft", "secret-draft");
    draft.status = "draft".to_string();
    srv.store.add_item(draft);
    let key = issue_key(&srv).await;

    let (_, body) = rpc_call(&srv, Some(&key), envelope("get_posts", json!({}))).await;
    assert_eq!(body["result"]["total"], json!(0));

    let (status, body) = rpc_call(
        &srv,
        Some(&key),
        envelope("get_post", json!({"slug": "secret-draft"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!(3001));

    let (_, body) = rpc_call(
        &srv,
        Some(&key),
        envelope("search_content", json!({"query": "secret"})),
    )
    .await;
    assert_eq!(body["result"]["total"], json!(0));
}
