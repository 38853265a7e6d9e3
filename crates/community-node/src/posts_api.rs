//! # Posts API
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/posts` | List posts, newest first |
//! | GET | `/api/posts/{post_id}/comments/count` | Count comments on a post |
//!
//! Posts are written by other clients; the gateway only reads them.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use community_store::{CollectionPath, Document, OrderBy};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState, COMMENTS, CREATED_AT};

/// Top-level post collection.
pub const POSTS: &str = "posts";

/// Response of the comment count endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCount {
    pub count: u64,
}

/// Creates the posts API routes.
pub fn posts_routes() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts))
        .route(
            "/api/posts/{post_id}/comments/count",
            get(count_post_comments),
        )
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    let posts = state
        .store
        .list(&CollectionPath::new(POSTS), &OrderBy::desc(CREATED_AT))
        .await
        .map_err(ApiError::operation("failed to fetch posts"))?;

    Ok(Json(posts))
}

async fn count_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<CommentCount>, ApiError> {
    let comments = CollectionPath::new(POSTS).sub_collection(post_id, COMMENTS);
    let count = state
        .store
        .count(&comments)
        .await
        .map_err(ApiError::operation("failed to count comments"))?;

    Ok(Json(CommentCount { count }))
}
