//! Startup seeding of the lesson catalogue.
//!
//! Lessons are not created through the API. For stores that start empty
//! (the in-memory store always does) a JSON array of lesson documents can be
//! loaded at startup. Seeding is skipped when the collection already holds
//! documents, so restarting against a persistent store is harmless.

use std::path::Path;

use serde_json::Value;
use storefront_api::{Document, ID_FIELD};

use crate::handlers::lessons::LESSON_COLLECTION;
use crate::storage::{Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed file must be a JSON array of objects: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Load lessons from the JSON array at `path` into an empty lesson collection.
///
/// Returns how many documents were inserted.
pub async fn seed_lessons(storage: &dyn Storage, path: &Path) -> Result<usize, SeedError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let docs = parse_seed(&raw)?;
    Ok(seed_collection(storage, LESSON_COLLECTION, docs).await?)
}

/// Parse a seed file body.
///
/// `_id` values exported in extended JSON form (`{"$oid": "..."}`) are
/// flattened to their hex string.
pub fn parse_seed(raw: &str) -> Result<Vec<Document>, serde_json::Error> {
    let mut docs: Vec<Document> = serde_json::from_str(raw)?;
    for doc in &mut docs {
        let oid = doc
            .get(ID_FIELD)
            .and_then(|id| id.get("$oid"))
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(hex) = oid {
            doc.insert(ID_FIELD.to_string(), Value::String(hex));
        }
    }
    Ok(docs)
}

/// Insert `docs` into `collection` unless it already holds documents.
pub async fn seed_collection(
    storage: &dyn Storage,
    collection: &str,
    docs: Vec<Document>,
) -> Result<usize, StorageError> {
    if !storage.find_all(collection).await?.is_empty() {
        tracing::info!("seed: {collection} already populated, skipping");
        return Ok(0);
    }
    let count = docs.len();
    for doc in docs {
        storage.insert_one(collection, doc).await?;
    }
    tracing::info!("seed: inserted {count} documents into {collection}");
    Ok(count)
}
