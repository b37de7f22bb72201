//! Generic collection handlers for `/collections/{collection_name}[/{id}]`.
//!
//! The [`Collection`] extractor resolves the `collection_name` path segment
//! into a handle on the shared store before the handler body runs. Only
//! collections on the configured allow-list resolve; anything else is 404.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use storefront_api::{Document, FieldUpdate, MessageResponse};

use crate::{
    error::AppError,
    json::{Payload, PrettyJson},
    storage::{Storage, StorageError},
};

use super::AppState;

const MAX_NAME_LEN: usize = 64;

// ---------------------------------------------------------------------------
// CollectionName
// ---------------------------------------------------------------------------

/// A syntactically valid collection name.
///
/// 1–64 characters from `[A-Za-z0-9_-]`, not starting with `system`
/// (reserved by MongoDB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionName(String);

#[derive(Debug, thiserror::Error)]
#[error("invalid collection name {0:?}")]
pub struct InvalidCollectionName(String);

impl CollectionName {
    pub fn parse(raw: &str) -> Result<Self, InvalidCollectionName> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_NAME_LEN
            && !raw.starts_with("system")
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidCollectionName(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Collection resolver
// ---------------------------------------------------------------------------

/// A store handle bound to one named collection.
pub struct Collection {
    name: CollectionName,
    storage: Arc<dyn Storage>,
}

impl Collection {
    pub fn name(&self) -> &CollectionName {
        &self.name
    }

    pub async fn find_all(&self) -> Result<Vec<Document>, StorageError> {
        self.storage.find_all(self.name.as_str()).await
    }

    pub async fn find_one(&self, id: &str) -> Result<Option<Document>, StorageError> {
        self.storage.find_one(self.name.as_str(), id).await
    }

    pub async fn update(&self, id: &str, fields: Document) -> Result<bool, StorageError> {
        self.storage.update_fields(self.name.as_str(), id, fields).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        self.storage.delete_one(self.name.as_str(), id).await
    }
}

fn collection_not_found() -> AppError {
    AppError::NotFound("Collection not found".into())
}

impl FromRequestParts<AppState> for Collection {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let raw = params
            .get("collection_name")
            .ok_or_else(collection_not_found)?;

        let name = CollectionName::parse(raw).map_err(|_| collection_not_found())?;
        if !state.config.collections.iter().any(|c| c == name.as_str()) {
            return Err(collection_not_found());
        }

        tracing::debug!(collection = %name, "resolved collection");
        Ok(Collection {
            name,
            storage: Arc::clone(&state.storage),
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn store_failure(collection: &Collection, action: &str, e: StorageError) -> AppError {
    tracing::error!(collection = %collection.name(), "error {action}: {e}");
    AppError::Internal(format!("An error occurred while {action}"))
}

/// `GET /collections/{collection_name}`: every document in the collection.
pub async fn list(collection: Collection) -> Result<PrettyJson<Vec<Document>>, AppError> {
    let docs = collection
        .find_all()
        .await
        .map_err(|e| store_failure(&collection, "fetching documents", e))?;
    Ok(PrettyJson(docs))
}

/// `GET /collections/{collection_name}/{id}`
pub async fn get_by_id(
    collection: Collection,
    Path((_, id)): Path<(String, String)>,
) -> Result<PrettyJson<Document>, AppError> {
    collection
        .find_one(&id)
        .await
        .map_err(|e| store_failure(&collection, "fetching the document", e))?
        .map(PrettyJson)
        .ok_or_else(|| AppError::NotFound("Document not found".into()))
}

/// `PUT /collections/{collection_name}/{id}`: set top-level fields.
pub async fn update(
    collection: Collection,
    Path((_, id)): Path<(String, String)>,
    Payload(update): Payload<FieldUpdate>,
) -> Result<PrettyJson<MessageResponse>, AppError> {
    update.validate()?;
    let matched = collection
        .update(&id, update.into_inner())
        .await
        .map_err(|e| store_failure(&collection, "updating the document", e))?;
    if !matched {
        return Err(AppError::NotFound("Document not found".into()));
    }
    Ok(PrettyJson(MessageResponse::new("Document updated successfully")))
}

/// `DELETE /collections/{collection_name}/{id}`
pub async fn remove(
    collection: Collection,
    Path((_, id)): Path<(String, String)>,
) -> Result<PrettyJson<MessageResponse>, AppError> {
    let deleted = collection
        .delete(&id)
        .await
        .map_err(|e| store_failure(&collection, "deleting the document", e))?;
    if !deleted {
        return Err(AppError::NotFound("Document not found".into()));
    }
    tracing::info!(collection = %collection.name(), id = %id, "document deleted");
    Ok(PrettyJson(MessageResponse::new("Document deleted successfully")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
