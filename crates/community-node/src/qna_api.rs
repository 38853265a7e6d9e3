//! # Q&A API
//!
//! Question threads and the comments nested under them.
//!
//! ## Question Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/qna` | List questions, newest first |
//! | POST | `/api/qna` | Create a question |
//! | GET | `/api/qna/{id}` | Get a question |
//! | PUT | `/api/qna/{id}` | Replace title and content |
//! | DELETE | `/api/qna/{id}` | Delete a question |
//!
//! ## Comment Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/qna/{id}/comments` | List comments, oldest first |
//! | POST | `/api/qna/{id}/comments` | Add a comment |
//! | DELETE | `/api/qna/{id}/comments/{comment_id}` | Delete a comment |
//!
//! Question bodies must carry every listed field as a string; anything else
//! is rejected. Updating a missing question fails, deleting one succeeds, and
//! deleting a question leaves its comments in place.
//!
//! ## Example: Creating a Question
//!
//! ```bash
//! curl -X POST http://localhost:3000/api/qna \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "title": "How do lifetimes work?",
//!     "content": "I keep fighting the borrow checker.",
//!     "authorEmail": "alice@example.com",
//!     "authorId": "u1"
//!   }'
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use community_store::{fields_from_json, CollectionPath, Document, Fields, OrderBy, Value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::api::{ApiError, ApiJson, AppState, Success, COMMENTS, CREATED_AT};

/// Top-level question collection.
pub const QNA: &str = "qna";

/// Fields a question update writes.
const EDITABLE_FIELDS: [&str; 2] = ["title", "content"];

/// Request to create a question.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub title: String,
    pub content: String,
    pub author_email: String,
    pub author_id: String,
}

impl CreateQuestionRequest {
    /// Stored fields. Other body keys, `createdAt` included, are dropped.
    fn into_fields(self) -> Fields {
        string_fields([
            ("title", self.title),
            ("content", self.content),
            ("authorEmail", self.author_email),
            ("authorId", self.author_id),
        ])
    }
}

/// Request to update a question.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub title: String,
    pub content: String,
}

impl UpdateQuestionRequest {
    fn into_fields(self) -> Fields {
        string_fields([("title", self.title), ("content", self.content)])
    }
}

fn string_fields<const N: usize>(pairs: [(&str, String); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::String(value)))
        .collect()
}

/// Response of question creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedQuestion {
    pub id: String,
}

fn questions() -> CollectionPath {
    CollectionPath::new(QNA)
}

fn comments_of(question_id: String) -> CollectionPath {
    questions().sub_collection(question_id, COMMENTS)
}

/// Creates the Q&A API routes.
pub fn qna_routes() -> Router<AppState> {
    Router::new()
        .route("/api/qna", get(list_questions).post(create_question))
        .route(
            "/api/qna/{id}",
            get(get_question)
                .put(update_question)
                .delete(delete_question),
        )
        .route(
            "/api/qna/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/api/qna/{id}/comments/{comment_id}",
            delete(delete_comment),
        )
}

async fn list_questions(State(state): State<AppState>) -> Result<Json<Vec<Document>>, ApiError> {
    let questions = state
        .store
        .list(&questions(), &OrderBy::desc(CREATED_AT))
        .await
        .map_err(ApiError::operation("failed to fetch questions"))?;

    Ok(Json(questions))
}

async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let question = state
        .store
        .get(&questions(), &id)
        .await
        .map_err(ApiError::operation("failed to fetch question"))?
        .ok_or(ApiError::NotFound("document not found"))?;

    Ok(Json(question))
}

async fn create_question(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state
        .store
        .add(&questions(), req.into_fields(), &[CREATED_AT])
        .await
        .map_err(ApiError::operation("failed to create question"))?;

    tracing::info!(id = %id, "Question created");
    Ok((StatusCode::CREATED, Json(CreatedQuestion { id })))
}

async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .update(&questions(), &id, req.into_fields(), &EDITABLE_FIELDS)
        .await
        .map_err(ApiError::operation("failed to update question"))?;

    Ok(Success::ok())
}

async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .delete(&questions(), &id)
        .await
        .map_err(ApiError::operation("failed to delete question"))?;

    tracing::info!(id = %id, "Question deleted");
    Ok(Success::ok())
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let comments = state
        .store
        .list(&comments_of(id), &OrderBy::asc(CREATED_AT))
        .await
        .map_err(ApiError::operation("failed to fetch comments"))?;

    Ok(Json(comments))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Map<String, JsonValue>>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .add(&comments_of(id), fields_from_json(body), &[])
        .await
        .map_err(ApiError::operation("failed to create comment"))?;

    Ok((StatusCode::CREATED, Success::ok()))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .delete(&comments_of(id), &comment_id)
        .await
        .map_err(ApiError::operation("failed to delete comment"))?;

    Ok(Success::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_ignores_extra_keys() {
        let req: CreateQuestionRequest = serde_json::from_str(
            r#"{"title": "T", "content": "C", "authorEmail": "e@x.com", "authorId": "u1",
                "createdAt": "client value"}"#,
        )
        .unwrap();
        let fields = req.into_fields();

        assert_eq!(fields.len(), 4);
        assert_eq!(fields["title"], Value::from("T"));
        assert_eq!(fields["authorEmail"], Value::from("e@x.com"));
        assert!(!fields.contains_key("createdAt"));
    }

    #[test]
    fn test_create_request_requires_every_field() {
        assert!(serde_json::from_str::<CreateQuestionRequest>(r#"{}"#).is_err());
        assert!(serde_json::from_str::<CreateQuestionRequest>(
            r#"{"title": "T", "content": "C", "authorEmail": "e@x.com"}"#
        )
        .is_err());
        assert!(serde_json::from_str::<CreateQuestionRequest>(
            r#"{"title": "T", "content": "C", "authorEmail": "e@x.com", "authorId": null}"#
        )
        .is_err());
    }

    #[test]
    fn test_update_request_only_carries_editable_fields() {
        let req: UpdateQuestionRequest =
            serde_json::from_str(r#"{"title": "new", "content": "body", "authorId": "other"}"#)
                .unwrap();
        let fields = req.into_fields();

        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["content", "title"]);
        assert!(serde_json::from_str::<UpdateQuestionRequest>(r#"{"title": "only"}"#).is_err());
    }
}
