//! Document store abstraction for the Community API.
//!
//! The gateway never talks to a database directly. It addresses schemaless
//! documents through [`CollectionPath`]s and issues one operation per request
//! against a [`DocumentStore`]. Two backends are provided:
//!
//! - [`MemoryStore`] (feature `memory`, default): in-process, same ordering and
//!   write semantics as the managed store. Used for local runs and tests.
//! - [`firestore::FirestoreStore`] (feature `firestore`): Cloud Firestore REST
//!   client authenticated with a service-account key.

mod document;
mod error;
mod traits;
mod value;

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "firestore")]
pub mod firestore;

pub use document::{auto_id, CollectionPath, Direction, Document, OrderBy};
pub use error::StoreError;
pub use traits::DocumentStore;
pub use value::{fields_from_json, Fields, Timestamp, Value};

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
