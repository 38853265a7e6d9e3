//! End-to-end tests for the read-only posts endpoints.

use axum::{body::Body, http::Request};
use community_node::{
    api::{create_router, AppState},
    config::CorsPolicy,
};
use community_store::{CollectionPath, DocumentStore, Fields, MemoryStore, Value};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app() -> (axum::Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let app = create_router(AppState::new(store.clone()), &CorsPolicy::default());
    (app, store)
}

async fn json_body(response: axum::response::Response) -> JsonValue {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn seed_post(store: &MemoryStore, title: &str) -> String {
    let mut fields = Fields::new();
    fields.insert("title".into(), Value::from(title));
    store
        .add(&CollectionPath::new("posts"), fields, &["createdAt"])
        .await
        .unwrap()
}

async fn seed_comments(store: &MemoryStore, post_id: &str, n: usize) {
    let comments = CollectionPath::new("posts").sub_collection(post_id, "comments");
    for i in 0..n {
        let mut fields = Fields::new();
        fields.insert("text".into(), Value::from(format!("comment {i}")));
        store.add(&comments, fields, &[]).await.unwrap();
    }
}

#[tokio::test]
async fn test_list_posts_newest_first() {
    let (app, store) = create_test_app();

    let older = seed_post(&store, "older").await;
    let newer = seed_post(&store, "newer").await;

    let response = app.oneshot(get("/api/posts")).await.unwrap();
    assert_eq!(response.status(), 200);

    let posts = json_body(response).await;
    assert_eq!(posts.as_array().unwrap().len(), 2);
    assert_eq!(posts[0]["id"], newer.as_str());
    assert_eq!(posts[0]["title"], "newer");
    assert_eq!(posts[1]["id"], older.as_str());
    assert!(posts[1]["createdAt"]["_seconds"].is_i64());
}

#[tokio::test]
async fn test_list_posts_empty() {
    let (app, _store) = create_test_app();

    let response = app.oneshot(get("/api/posts")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_comment_count() {
    let (app, store) = create_test_app();
    let post = seed_post(&store, "popular").await;
    let quiet = seed_post(&store, "quiet").await;

    seed_comments(&store, &post, 3).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/posts/{post}/comments/count")))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await, json!({"count": 3}));

    let response = app
        .clone()
        .oneshot(get(&format!("/api/posts/{quiet}/comments/count")))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!({"count": 0}));
}

#[tokio::test]
async fn test_comment_count_for_unknown_post_is_zero() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(get("/api/posts/nosuchpost/comments/count"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await, json!({"count": 0}));
}
