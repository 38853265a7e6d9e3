//! Document store backend trait.
//!
//! Defines the operations the gateway issues against a schemaless store.
//! Every call is independent; backends own whatever connection state they
//! need and are shared read-only across requests.

use async_trait::async_trait;

use crate::{CollectionPath, Document, Fields, OrderBy, Result};

/// Collection-scoped CRUD over schemaless documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists the documents of a collection in the given order.
    ///
    /// Documents without the ordering field are not part of the result.
    /// Equal values are tie-broken by document id in the same direction.
    async fn list(&self, collection: &CollectionPath, order: &OrderBy) -> Result<Vec<Document>>;

    /// Counts the documents of a collection.
    async fn count(&self, collection: &CollectionPath) -> Result<u64>;

    /// Fetches a single document, `None` if it does not exist.
    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>>;

    /// Inserts a document under a freshly generated id and returns the id.
    ///
    /// Each field named in `server_timestamps` is set to the store's clock at
    /// write time, overriding any supplied value.
    async fn add(
        &self,
        collection: &CollectionPath,
        fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<String>;

    /// Writes the fields named in `mask`.
    ///
    /// Masked fields present in `fields` are set, masked fields absent from it
    /// are removed, and unmasked fields are left alone. Fails with
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) if the document
    /// does not exist.
    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        fields: Fields,
        mask: &[&str],
    ) -> Result<()>;

    /// Deletes a document. Deleting a missing document succeeds. Nested
    /// collections under the document are not touched.
    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()>;
}
