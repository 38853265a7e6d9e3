//! HTTP API for the community gateway.
//!
//! Shared state, the error type every handler returns, and the root router
//! that mounts the resource routes behind CORS, tracing, and request ids.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use community_store::{DocumentStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::CorsPolicy;
use crate::observability::request_id_middleware;
use crate::posts_api::posts_routes;
use crate::qna_api::qna_routes;

/// Field holding a document's creation time.
pub const CREATED_AT: &str = "createdAt";

/// Name of the comment collection nested under posts and questions.
pub const COMMENTS: &str = "comments";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store every request is passed through to.
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    /// Creates state over a store handle.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

/// API error type.
///
/// The message is what clients see; the underlying cause is only logged.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{context}")]
    Operation {
        context: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("invalid request body")]
    InvalidBody(#[from] JsonRejection),
}

impl ApiError {
    /// Adapter for `map_err` that tags a store failure with the message
    /// returned to the client.
    ///
    /// ```
    /// use community_node::api::ApiError;
    /// use community_store::StoreError;
    ///
    /// let failed: Result<(), StoreError> = Err(StoreError::Transport("reset".into()));
    /// let err = failed.map_err(ApiError::operation("failed to fetch posts")).unwrap_err();
    /// assert_eq!(err.to_string(), "failed to fetch posts");
    /// ```
    pub fn operation(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| ApiError::Operation { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Operation { context, source } => {
                tracing::error!(context = %context, error = %source, "Store operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::InvalidBody(rejection) => {
                tracing::warn!(error = %rejection, "Rejected request body");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// `{"success": true}` acknowledgement for writes that return no data.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// JSON body extractor whose rejection is an [`ApiError`], so malformed
/// bodies get the same `{error}` response as any other failure.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Creates the API router.
pub fn create_router(state: AppState, cors: &CorsPolicy) -> Router {
    Router::new()
        .route("/", get(liveness))
        .merge(posts_routes())
        .merge(qna_routes())
        .layer(cors.layer())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness endpoint.
async fn liveness() -> &'static str {
    "Backend server is running"
}
