//! Cloud Firestore backend over the REST v1 API.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `POST {parent}/documents:runQuery` with one `orderBy` |
//! | count | `POST {parent}/documents:runAggregationQuery` with a `count` aggregation |
//! | get | `GET {document}` (HTTP 404 means absent) |
//! | add | `POST {database}/documents:commit` with `REQUEST_TIME` transforms |
//! | update | `PATCH {document}?updateMask.fieldPaths=..&currentDocument.exists=true` |
//! | delete | `DELETE {document}` |
//!
//! Authentication uses a service-account key (see [`ServiceAccountKey`]) or,
//! against the local emulator, the emulator's fixed token.

mod auth;
mod codec;
mod credentials;

pub use credentials::ServiceAccountKey;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value as Json};
use url::Url;

use self::auth::TokenSource;
use self::codec::{decode_value, encode_fields, RawDocument};
use crate::{
    auto_id, CollectionPath, Direction, Document, DocumentStore, Fields, OrderBy, Result,
    StoreError, Value,
};

/// Production REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    document: Option<RawDocument>,
}

#[derive(Debug, Deserialize)]
struct AggregationResponse {
    result: Option<AggregationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregationResult {
    #[serde(default)]
    aggregate_fields: Map<String, Json>,
}

/// Firestore REST client.
pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: Url,
    project_id: String,
    tokens: TokenSource,
}

impl FirestoreStore {
    /// Connects to production Firestore with a service-account key.
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        Self::with_base_url(key, DEFAULT_BASE_URL)
    }

    /// Connects to a custom endpoint with a service-account key.
    pub fn with_base_url(key: ServiceAccountKey, base_url: &str) -> Result<Self> {
        let project_id = key.project_id.clone();
        Self::build(base_url, project_id, TokenSource::service_account(key)?)
    }

    /// Connects to a Firestore emulator listening on `host` (`host:port`).
    pub fn emulator(host: &str, project_id: impl Into<String>) -> Result<Self> {
        Self::build(
            &format!("http://{host}/v1"),
            project_id.into(),
            TokenSource::Emulator,
        )
    }

    fn build(base_url: &str, project_id: String, tokens: TokenSource) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::InvalidPath(format!("invalid base URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::InvalidPath(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("community-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        tracing::info!(base_url = %base_url, project_id = %project_id, "Firestore client ready");

        Ok(Self {
            http,
            base_url,
            project_id,
            tokens,
        })
    }

    /// Project the client reads and writes.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// `projects/{project}/databases/(default)/documents`
    fn documents_root(&self) -> Vec<String> {
        vec![
            "projects".to_string(),
            self.project_id.clone(),
            "databases".to_string(),
            "(default)".to_string(),
            "documents".to_string(),
        ]
    }

    /// Full resource name of a document, as used inside request bodies.
    fn document_name(&self, collection: &CollectionPath, id: &str) -> String {
        format!("{}/{}/{}", self.documents_root().join("/"), collection, id)
    }

    fn url(&self, segments: &[String]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidPath(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn document_url(&self, collection: &CollectionPath, id: &str) -> Result<Url> {
        let mut segments = self.documents_root();
        segments.extend(collection.segments().into_iter().map(str::to_string));
        segments.push(id.to_string());
        self.url(&segments)
    }

    /// URL of a custom method (`:runQuery`, ...) on the parent of `collection`.
    fn parent_method_url(&self, collection: &CollectionPath, method: &str) -> Result<Url> {
        let mut segments = self.documents_root();
        let path = collection.segments();
        segments.extend(path[..path.len() - 1].iter().map(|s| s.to_string()));
        if let Some(last) = segments.last_mut() {
            last.push(':');
            last.push_str(method);
        }
        self.url(&segments)
    }

    /// URL of a custom method on the database's document root.
    fn root_method_url(&self, method: &str) -> Result<Url> {
        let mut segments = self.documents_root();
        if let Some(last) = segments.last_mut() {
            last.push(':');
            last.push_str(method);
        }
        self.url(&segments)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.tokens.bearer(&self.http).await?;
        request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))
    }

    async fn send_ok(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.send(request).await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status { status, body })
}

async fn decode_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn list(&self, collection: &CollectionPath, order: &OrderBy) -> Result<Vec<Document>> {
        collection.validate()?;

        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection.collection_id() }],
                "orderBy": [{
                    "field": { "fieldPath": order.field },
                    "direction": direction,
                }],
            }
        });

        let url = self.parent_method_url(collection, "runQuery")?;
        let response = self.send_ok(self.http.post(url).json(&query)).await?;
        let results: Vec<RunQueryResponse> = decode_json(response).await?;

        results
            .into_iter()
            .filter_map(|result| result.document)
            .map(RawDocument::into_document)
            .collect()
    }

    async fn count(&self, collection: &CollectionPath) -> Result<u64> {
        collection.validate()?;

        let query = json!({
            "structuredAggregationQuery": {
                "structuredQuery": {
                    "from": [{ "collectionId": collection.collection_id() }],
                },
                "aggregations": [{ "alias": "count", "count": {} }],
            }
        });

        let url = self.parent_method_url(collection, "runAggregationQuery")?;
        let response = self.send_ok(self.http.post(url).json(&query)).await?;
        let results: Vec<AggregationResponse> = decode_json(response).await?;

        let Some(count) = results
            .into_iter()
            .filter_map(|r| r.result)
            .find_map(|mut r| r.aggregate_fields.remove("count"))
        else {
            return Ok(0);
        };

        match decode_value(&count)? {
            Value::Integer(n) if n >= 0 => Ok(n as u64),
            other => Err(StoreError::Decode(format!("unexpected count: {other:?}"))),
        }
    }

    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>> {
        collection.validate_document(id)?;

        let url = self.document_url(collection, id)?;
        let response = self.send(self.http.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let raw: RawDocument = decode_json(ensure_success(response).await?).await?;
        raw.into_document().map(Some)
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        mut fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<String> {
        collection.validate()?;

        for field in server_timestamps {
            fields.remove(*field);
        }

        let id = auto_id();
        let mut write = json!({
            "update": {
                "name": self.document_name(collection, &id),
                "fields": encode_fields(&fields)?,
            },
            "currentDocument": { "exists": false },
        });
        if !server_timestamps.is_empty() {
            write["updateTransforms"] = server_timestamps
                .iter()
                .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
                .collect();
        }

        let url = self.root_method_url("commit")?;
        self.send_ok(self.http.post(url).json(&json!({ "writes": [write] })))
            .await?;

        tracing::debug!(collection = %collection, id = %id, "Document added");
        Ok(id)
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        fields: Fields,
        mask: &[&str],
    ) -> Result<()> {
        collection.validate_document(id)?;

        let masked: Fields = fields
            .into_iter()
            .filter(|(name, _)| mask.contains(&name.as_str()))
            .collect();
        let mut query: Vec<(&str, &str)> = mask
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let url = self.document_url(collection, id)?;
        let body = json!({ "fields": encode_fields(&masked)? });
        let response = self
            .send(self.http.patch(url).query(&query).json(&body))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(format!("{collection}/{id}")));
        }

        ensure_success(response).await?;
        Ok(())
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()> {
        collection.validate_document(id)?;

        let url = self.document_url(collection, id)?;
        self.send_ok(self.http.delete(url)).await?;
        Ok(())
    }
}
