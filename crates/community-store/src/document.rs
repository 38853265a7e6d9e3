//! Documents and collection addressing.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

use crate::{Fields, Result, StoreError, Value};

/// Length of generated document identifiers.
const AUTO_ID_LEN: usize = 20;

/// Generates a fresh 20-character alphanumeric document identifier.
pub fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

/// Address of a collection: a top-level collection, optionally nested under
/// parent documents.
///
/// ```
/// use community_store::CollectionPath;
///
/// let comments = CollectionPath::new("qna").sub_collection("abc123", "comments");
/// assert_eq!(comments.to_string(), "qna/abc123/comments");
/// assert_eq!(comments.collection_id(), "comments");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    root: String,
    nested: Vec<(String, String)>,
}

impl CollectionPath {
    /// Addresses a top-level collection.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            nested: Vec::new(),
        }
    }

    /// Addresses the collection `name` nested under document `parent_id` of
    /// this collection.
    pub fn sub_collection(mut self, parent_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.nested.push((parent_id.into(), name.into()));
        self
    }

    /// Name of the addressed collection (the last segment).
    pub fn collection_id(&self) -> &str {
        self.nested
            .last()
            .map(|(_, name)| name.as_str())
            .unwrap_or(&self.root)
    }

    /// All path segments, alternating collection names and document ids.
    pub fn segments(&self) -> Vec<&str> {
        let mut segments = vec![self.root.as_str()];
        for (id, name) in &self.nested {
            segments.push(id);
            segments.push(name);
        }
        segments
    }

    /// Checks that every segment is non-empty and free of `/`.
    pub fn validate(&self) -> Result<()> {
        for segment in self.segments() {
            validate_segment(segment)?;
        }
        Ok(())
    }

    /// Checks a document id addressed within this collection.
    pub fn validate_document(&self, id: &str) -> Result<()> {
        self.validate()?;
        validate_segment(id)
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath("empty path segment".into()));
    }
    if segment.contains('/') {
        return Err(StoreError::InvalidPath(format!(
            "path segment contains '/': {segment}"
        )));
    }
    Ok(())
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

/// Sort direction of an ordered scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering applied to a collection scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Top-level field to order by.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

impl OrderBy {
    /// Orders by `field`, smallest first.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    /// Orders by `field`, largest first.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }
}

/// A stored document: its identifier plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier, unique within the collection.
    pub id: String,
    /// Field values.
    pub fields: Fields,
}

impl Document {
    /// Creates a document.
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Returns a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// Serialized as `{ "id": .., ...fields }`. The identifier always wins over a
/// stored field that happens to be called `id`.
impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        for (name, value) in self.fields.iter().filter(|(name, _)| *name != "id") {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auto_id_shape() {
        let id = auto_id();
        assert_eq!(id.len(), AUTO_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, auto_id());
    }

    #[test]
    fn test_collection_path_addressing() {
        let root = CollectionPath::new("posts");
        assert_eq!(root.collection_id(), "posts");
        assert_eq!(root.segments(), vec!["posts"]);

        let nested = CollectionPath::new("posts").sub_collection("p1", "comments");
        assert_eq!(nested.collection_id(), "comments");
        assert_eq!(nested.segments(), vec!["posts", "p1", "comments"]);
    }

    #[test]
    fn test_collection_path_validation() {
        assert!(CollectionPath::new("qna").validate().is_ok());
        assert!(CollectionPath::new("qna")
            .sub_collection("", "comments")
            .validate()
            .is_err());
        assert!(CollectionPath::new("qna")
            .sub_collection("a/b", "comments")
            .validate()
            .is_err());
        assert!(CollectionPath::new("qna").validate_document("x/y").is_err());
        assert!(CollectionPath::new("qna").validate_document("xy").is_ok());
    }

    #[test]
    fn test_document_serializes_id_first_and_wins() {
        let mut fields = Fields::new();
        fields.insert("id".into(), Value::from("shadowed"));
        fields.insert("title".into(), Value::from("T"));
        let doc = Document::new("real", fields);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json, json!({"id": "real", "title": "T"}));
    }
}
