//! MongoDB-backed storage implementation.
//!
//! Wraps a [`mongodb::Database`] handle. The driver owns its own connection
//! pool and connects lazily, so construction never blocks on the network and
//! a lost connection simply surfaces as [`StorageError::Internal`] on the
//! next call.
//!
//! Documents cross the boundary as JSON objects. `_id` values that are
//! ObjectIds are rendered as their 24-character hex form; incoming ids that
//! parse as ObjectIds match either representation, anything else is matched
//! as a plain string.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document as BsonDocument},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, ReturnDocument, ServerApi, ServerApiVersion},
    Client, Collection, Database,
};
use serde_json::Value;
use storefront_api::{remaining_of, Document};

use super::{DecrementOutcome, Storage, StorageError};

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB implementation of [`Storage`].
pub struct MongoStorage {
    db: Database,
}

impl MongoStorage {
    /// Build a client for `uri` pinned to Stable API v1 and select `database`.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, mongodb::error::Error> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        let client = Client::with_options(options)?;
        Ok(Self {
            db: client.database(database),
        })
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.db.collection(name)
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn map_err(e: mongodb::error::Error) -> StorageError {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(w)) if w.code == DUPLICATE_KEY => {
            StorageError::Conflict(w.message.clone())
        }
        _ => StorageError::Internal(e.to_string()),
    }
}

// A 24-hex id may have been stored either as an ObjectId or as a plain
// string (e.g. seeded from an export), so both forms are matched.
fn id_filter(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::Document(doc! { "$in": [oid, id] }),
        Err(_) => Bson::String(id.to_owned()),
    }
}

// Only counters that read back as an i64 may be written, so an applied
// decrement can always report the new value.
fn decrement_filter(id: &str, quantity: i64) -> BsonDocument {
    doc! {
        "_id": id_filter(id),
        "remaining": {
            "$type": ["int", "long", "double"],
            "$gte": quantity,
            "$lte": i64::MAX,
        },
        // `$and` short-circuits, so `$trunc` never sees a non-number.
        "$expr": {
            "$and": [
                { "$isNumber": "$remaining" },
                { "$eq": ["$remaining", { "$trunc": "$remaining" }] },
            ]
        },
    }
}

fn id_to_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

fn to_json(doc: BsonDocument) -> Document {
    doc.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Bson::ObjectId(oid) => Value::String(oid.to_hex()),
                other => other.into_relaxed_extjson(),
            };
            (key, value)
        })
        .collect()
}

fn from_json(doc: Document) -> Result<BsonDocument, StorageError> {
    BsonDocument::try_from(doc)
        .map_err(|e| StorageError::Internal(format!("document conversion failed: {e}")))
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for MongoStorage {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let docs: Vec<BsonDocument> = self
            .collection(collection)
            .find(doc! {})
            .await
            .map_err(map_err)?
            .try_collect()
            .await
            .map_err(map_err)?;
        Ok(docs.into_iter().map(to_json).collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StorageError> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": id_filter(id) })
            .await
            .map_err(map_err)?;
        Ok(found.map(to_json))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> Result<String, StorageError> {
        let result = self
            .collection(collection)
            .insert_one(from_json(doc)?)
            .await
            .map_err(map_err)?;
        Ok(id_to_string(result.inserted_id))
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<bool, StorageError> {
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id_filter(id) }, doc! { "$set": from_json(fields)? })
            .await
            .map_err(map_err)?;
        Ok(result.matched_count > 0)
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id_filter(id) })
            .await
            .map_err(map_err)?;
        Ok(result.deleted_count > 0)
    }

    async fn decrement_remaining(
        &self,
        collection: &str,
        id: &str,
        quantity: i64,
    ) -> Result<DecrementOutcome, StorageError> {
        let coll = self.collection(collection);
        let updated = coll
            .find_one_and_update(
                decrement_filter(id, quantity),
                doc! { "$inc": { "remaining": -quantity } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_err)?;

        if let Some(doc) = updated {
            return Ok(remaining_of(&to_json(doc))
                .map(|remaining| DecrementOutcome::Applied { remaining })
                .unwrap_or(DecrementOutcome::Inconsistent));
        }

        // The filter did not match. This follow-up read only classifies the
        // failure; nothing is written based on it.
        let current = coll
            .find_one(doc! { "_id": id_filter(id) })
            .await
            .map_err(map_err)?;
        Ok(match current.map(to_json) {
            None => DecrementOutcome::NotFound,
            Some(doc) => match remaining_of(&doc) {
                Some(remaining) if remaining < quantity => {
                    DecrementOutcome::Insufficient { remaining }
                }
                _ => DecrementOutcome::Inconsistent,
            },
        })
    }
}
