//! Document store abstraction for the storefront server.
//!
//! The [`Storage`] trait defines the contract between the HTTP handler layer
//! and persistence. Collections are addressed by name and documents by their
//! `_id`; storage knows nothing about lessons or orders beyond the seat
//! counter used by [`Storage::decrement_remaining`].
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStorage`] | Tests, conformance suite, ephemeral runs |
//! | [`SqliteStorage`] | Durable single-file store |
//! | [`MongoStorage`] | Production; a MongoDB deployment |
//!
//! [`MemoryStorage`]: memory::MemoryStorage
//! [`SqliteStorage`]: sqlite::SqliteStorage
//! [`MongoStorage`]: mongo::MongoStorage

pub mod memory;
pub mod mongo;
pub mod sqlite;

use async_trait::async_trait;
use storefront_api::Document;

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A document with the same `_id` already exists in the collection.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The document cannot be stored as given, e.g. a non-string `_id`.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// DecrementOutcome
// ---------------------------------------------------------------------------

/// Result of the conditional seat decrement.
///
/// The check and the write are one store operation, so `Applied` is only
/// ever reported when the counter was at least `quantity` at the moment of
/// the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// The counter was decremented; `remaining` is the new value.
    Applied { remaining: i64 },
    /// No document with that id exists. Nothing was written.
    NotFound,
    /// The counter is below the requested quantity. Nothing was written.
    Insufficient { remaining: i64 },
    /// The document exists but the condition still failed, e.g. the counter
    /// is missing or not an integer.
    Inconsistent,
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// The persistence contract for the storefront.
///
/// All methods are `async` and return `Result<_, StorageError>`. Implementations
/// must be `Send + Sync + 'static` so they can be held in an `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Return every document in `collection`, in the store's natural order.
    /// An unknown collection is simply empty.
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StorageError>;

    /// Retrieve a document by `_id`. Returns `None` if not found.
    async fn find_one(&self, collection: &str, id: &str)
        -> Result<Option<Document>, StorageError>;

    /// Insert `doc` and return its identifier.
    ///
    /// When `doc` carries no `_id` the store generates a fresh one. A string
    /// `_id` that already exists yields [`StorageError::Conflict`]; backends
    /// that only hold string ids reject any other `_id` with
    /// [`StorageError::InvalidDocument`].
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<String, StorageError>;

    /// Set the given top-level fields on a document.
    ///
    /// Returns `false` when no document with `id` exists.
    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<bool, StorageError>;

    /// Remove a document. Returns `false` when no document with `id` exists.
    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StorageError>;

    /// Atomically decrement the `remaining` field by `quantity`, only if
    /// `remaining >= quantity` at the moment of the write.
    async fn decrement_remaining(
        &self,
        collection: &str,
        id: &str,
        quantity: i64,
    ) -> Result<DecrementOutcome, StorageError>;
}

/// Fresh identifier for backends that do not generate their own.
///
/// UUIDv7 in simple form sorts by creation time, so a `BTreeMap` keyed on it
/// iterates in insertion order.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

/// Pull a string `_id` out of `doc`, generating one when absent.
///
/// Non-string identifiers are rejected so every stored id renders as a string.
pub(crate) fn take_or_assign_id(doc: &mut Document) -> Result<String, StorageError> {
    use serde_json::Value;
    use storefront_api::ID_FIELD;

    match doc.get(ID_FIELD) {
        None => {
            let id = new_document_id();
            doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            Ok(id)
        }
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(other) => Err(StorageError::InvalidDocument(format!(
            "_id must be a non-empty string, got {other}"
        ))),
    }
}
