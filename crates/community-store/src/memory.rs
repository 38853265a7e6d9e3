//! In-memory document store.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};

use crate::{
    auto_id, CollectionPath, Direction, Document, DocumentStore, Fields, OrderBy, Result,
    StoreError, Timestamp, Value,
};

/// In-memory document store.
///
/// Thread-safe storage with the same observable semantics as the managed
/// store: ordered scans skip documents lacking the ordering field, masked
/// updates require an existing document, deletes are idempotent, and server timestamps strictly
/// increase.
#[derive(Default)]
pub struct MemoryStore {
    /// Documents by collection path, then by id.
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
    /// Last timestamp handed out by the server clock.
    clock: Mutex<Timestamp>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the server clock. Consecutive readings never repeat.
    fn server_time(&self) -> Timestamp {
        let mut last = self.clock.lock();
        let now = Timestamp::now().max(last.successor());
        *last = now;
        now
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &CollectionPath, order: &OrderBy) -> Result<Vec<Document>> {
        collection.validate()?;

        let collections = self.collections.read();
        let Some(documents) = collections.get(&collection.to_string()) else {
            return Ok(Vec::new());
        };

        let mut ordered: Vec<(&Value, &String, &Fields)> = documents
            .iter()
            .filter_map(|(id, fields)| fields.get(&order.field).map(|v| (v, id, fields)))
            .collect();

        ordered.sort_by(|(va, ida, _), (vb, idb, _)| va.compare(vb).then_with(|| ida.cmp(idb)));
        if order.direction == Direction::Descending {
            ordered.reverse();
        }

        Ok(ordered
            .into_iter()
            .map(|(_, id, fields)| Document::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn count(&self, collection: &CollectionPath) -> Result<u64> {
        collection.validate()?;

        Ok(self
            .collections
            .read()
            .get(&collection.to_string())
            .map_or(0, |documents| documents.len() as u64))
    }

    async fn get(&self, collection: &CollectionPath, id: &str) -> Result<Option<Document>> {
        collection.validate_document(id)?;

        Ok(self
            .collections
            .read()
            .get(&collection.to_string())
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        mut fields: Fields,
        server_timestamps: &[&str],
    ) -> Result<String> {
        collection.validate()?;

        if !server_timestamps.is_empty() {
            let now = self.server_time();
            for field in server_timestamps {
                fields.insert((*field).to_string(), Value::Timestamp(now));
            }
        }

        let mut collections = self.collections.write();
        let documents = collections.entry(collection.to_string()).or_default();

        let mut id = auto_id();
        while documents.contains_key(&id) {
            id = auto_id();
        }

        documents.insert(id.clone(), fields);
        tracing::debug!(collection = %collection, id = %id, "Document added");
        Ok(id)
    }

    async fn update(
        &self,
        collection: &CollectionPath,
        id: &str,
        mut fields: Fields,
        mask: &[&str],
    ) -> Result<()> {
        collection.validate_document(id)?;

        let mut collections = self.collections.write();
        let Some(document) = collections
            .get_mut(&collection.to_string())
            .and_then(|documents| documents.get_mut(id))
        else {
            return Err(StoreError::NotFound(format!("{collection}/{id}")));
        };

        for field in mask {
            match fields.remove(*field) {
                Some(value) => {
                    document.insert((*field).to_string(), value);
                }
                None => {
                    document.remove(*field);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &CollectionPath, id: &str) -> Result<()> {
        collection.validate_document(id)?;

        if let Some(documents) = self.collections.write().get_mut(&collection.to_string()) {
            documents.remove(id);
        }
        Ok(())
    }
}
