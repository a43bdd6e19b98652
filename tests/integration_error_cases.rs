#![allow(clippy::unwrap_used, clippy::panic, clippy::missing_panics_doc, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::{Value, json};

mod common;

async fn assert_invalid_argument(resp: reqwest::Response) {
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_ARGUMENT");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_conversation_type_rejected() {
    let app = common::TestApp::spawn().await;

    let resp = app.create_conversation(json!({ "type": "CHANNEL", "memberIds": ["a"] })).await;
    assert_invalid_argument(resp).await;
}

#[tokio::test]
async fn test_blank_member_id_rejected() {
    let app = common::TestApp::spawn().await;

    let resp = app.create_conversation(json!({ "type": "PRIVATE", "memberIds": ["a", ""] })).await;
    assert_invalid_argument(resp).await;
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .post(format!("{}/v1/conversations", app.server_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_invalid_argument(resp).await;
}

#[tokio::test]
async fn test_malformed_conversation_id_rejected() {
    let app = common::TestApp::spawn().await;

    assert_invalid_argument(app.get_conversation("not-a-uuid", "").await).await;
    assert_invalid_argument(app.post_message("not-a-uuid", "a", "hi").await).await;
}

#[tokio::test]
async fn test_zero_page_sizes_return_everything() {
    let app = common::TestApp::spawn().await;
    let conversation = app.create_conversation_ok("PRIVATE", &["a", "b"]).await;
    let id = conversation["id"].as_str().unwrap();
    for i in 0..3 {
        app.post_message_ok(id, "a", &format!("m{i}")).await;
    }
    app.create_conversation_ok("GROUP", &["a", "c"]).await;

    let resp = app.search(json!({ "memberIds": ["a"], "pageSize": 0, "messagePageSize": 0 })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    let conversations = body["conversations"].as_array().unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(common::contents(&conversations[0]["messages"]), ["m2", "m1", "m0"]);

    let found = app.get_conversation(id, "?messagePageSize=0").await;
    assert_eq!(found.status(), StatusCode::OK);
    let found: Value = found.json().await.unwrap();
    assert_eq!(common::contents(&found["messages"]), ["m2", "m1", "m0"]);
}

#[tokio::test]
async fn test_negative_page_size_counts_by_magnitude() {
    let app = common::TestApp::spawn().await;
    let conversation = app.create_conversation_ok("GROUP", &["a"]).await;
    let id = conversation["id"].as_str().unwrap();
    for i in 0..3 {
        app.post_message_ok(id, "a", &format!("m{i}")).await;
    }

    let resp = app.list_messages(id, "?pageSize=-2").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(common::contents(&body["messages"]), ["m2", "m1"]);
}

#[tokio::test]
async fn test_malformed_time_bound_rejected() {
    let app = common::TestApp::spawn().await;
    let conversation = app.create_conversation_ok("GROUP", &["a"]).await;
    let id = conversation["id"].as_str().unwrap();

    assert_invalid_argument(app.list_messages(id, "?before=yesterday").await).await;
}

#[tokio::test]
async fn test_oversized_page_returns_everything() {
    let app = common::TestApp::spawn().await;
    let conversation = app.create_conversation_ok("GROUP", &["a"]).await;
    let id = conversation["id"].as_str().unwrap();
    for i in 0..3 {
        app.post_message_ok(id, "a", &format!("m{i}")).await;
    }

    let resp = app.list_messages(id, "?pageSize=100000").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 3);

    let huge = app.search(json!({ "memberIds": ["a"], "pageSize": i64::MAX, "messagePageSize": i64::MAX })).await;
    assert_eq!(huge.status(), StatusCode::OK);
    let huge: Value = huge.json().await.unwrap();
    assert_eq!(huge["conversations"][0]["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = common::TestApp::spawn().await;

    let resp = app
        .client
        .post(format!("{}/v1/conversations/search", app.server_url))
        .header("x-request-id", "trace-me-123")
        .json(&json!({ "memberIds": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], "trace-me-123");

    let generated = app.search(json!({ "memberIds": [] })).await;
    assert!(generated.headers().contains_key("x-request-id"));
}
