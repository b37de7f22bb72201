//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and ephemeral runs.
//!
//! Each collection is a [`BTreeMap`] keyed by `_id`. Generated ids are
//! UUIDv7, which sort in creation order, so iteration follows insertion for
//! documents created through the API.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use storefront_api::{remaining_of, Document, REMAINING_FIELD};

use super::{take_or_assign_id, DecrementOutcome, Storage, StorageError};

type Collection = BTreeMap<String, Document>;

/// Thread-safe, in-memory implementation of [`Storage`].
pub struct MemoryStorage {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    // A panicking writer cannot leave a half-applied document behind, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Collection>> {
        self.collections.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Collection>> {
        self.collections.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let inner = self.read();
        Ok(inner
            .get(collection)
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StorageError> {
        let inner = self.read();
        Ok(inner.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> Result<String, StorageError> {
        let id = take_or_assign_id(&mut doc)?;
        let mut inner = self.write();
        let docs = inner.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StorageError::Conflict(format!(
                "document {id} already exists in {collection}"
            )));
        }
        docs.insert(id.clone(), doc);
        Ok(id)
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<bool, StorageError> {
        let mut inner = self.write();
        let Some(doc) = inner.get_mut(collection).and_then(|c| c.get_mut(id)) else {
            return Ok(false);
        };
        doc.extend(fields);
        Ok(true)
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        let mut inner = self.write();
        Ok(inner
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .is_some())
    }

    async fn decrement_remaining(
        &self,
        collection: &str,
        id: &str,
        quantity: i64,
    ) -> Result<DecrementOutcome, StorageError> {
        // Check and write happen under the same write guard.
        let mut inner = self.write();
        let Some(doc) = inner.get_mut(collection).and_then(|c| c.get_mut(id)) else {
            return Ok(DecrementOutcome::NotFound);
        };
        let Some(remaining) = remaining_of(doc) else {
            return Ok(DecrementOutcome::Inconsistent);
        };
        if remaining < quantity {
            return Ok(DecrementOutcome::Insufficient { remaining });
        }
        let updated = remaining - quantity;
        doc.insert(REMAINING_FIELD.to_string(), updated.into());
        Ok(DecrementOutcome::Applied { remaining: updated })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    async fn seeded_course(s: &MemoryStorage, remaining: i64) -> String {
        s.insert_one(
            "lesson",
            doc(json!({ "subject": "Maths", "price": 100, "remaining": remaining })),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_find() {
        let s = MemoryStorage::new();
        let id = s
            .insert_one("orders", doc(json!({ "name": "Ada" })))
            .await
            .unwrap();
        let got = s.find_one("orders", &id).await.unwrap().unwrap();
        assert_eq!(got["name"], json!("Ada"));
        assert_eq!(got["_id"], json!(id));
        assert!(s.find_one("orders", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_returns_every_document() {
        let s = MemoryStorage::new();
        for n in 0..4 {
            s.insert_one("lesson", doc(json!({ "n": n }))).await.unwrap();
        }
        let all = s.find_all("lesson").await.unwrap();
        assert_eq!(all.len(), 4);
        let ns: Vec<i64> = all.iter().map(|d| d["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3]);
        assert!(s.find_all("nothing-here").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn identical_inserts_get_distinct_ids() {
        let s = MemoryStorage::new();
        let body = doc(json!({ "name": "Ada", "lessons": ["l1"] }));
        let a = s.insert_one("orders", body.clone()).await.unwrap();
        let b = s.insert_one("orders", body).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(s.find_all("orders").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_explicit_id_conflicts() {
        let s = MemoryStorage::new();
        s.insert_one("lesson", doc(json!({ "_id": "l1" }))).await.unwrap();
        let err = s
            .insert_one("lesson", doc(json!({ "_id": "l1" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn numeric_id_is_an_invalid_document() {
        let s = MemoryStorage::new();
        let err = s
            .insert_one("lesson", doc(json!({ "_id": 7 })))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidDocument(_)));
        assert!(s.find_all("lesson").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete() {
        let s = MemoryStorage::new();
        let id = seeded_course(&s, 5).await;
        assert!(s
            .update_fields("lesson", &id, doc(json!({ "price": 90 })))
            .await
            .unwrap());
        let got = s.find_one("lesson", &id).await.unwrap().unwrap();
        assert_eq!(got["price"], json!(90));
        assert_eq!(got["subject"], json!("Maths"));

        assert!(!s
            .update_fields("lesson", "missing", doc(json!({ "price": 1 })))
            .await
            .unwrap());

        assert!(s.delete_one("lesson", &id).await.unwrap());
        assert!(!s.delete_one("lesson", &id).await.unwrap());
    }

    #[tokio::test]
    async fn decrement_applies_when_enough_seats() {
        let s = MemoryStorage::new();
        let id = seeded_course(&s, 5).await;
        let out = s.decrement_remaining("lesson", &id, 3).await.unwrap();
        assert_eq!(out, DecrementOutcome::Applied { remaining: 2 });
        let got = s.find_one("lesson", &id).await.unwrap().unwrap();
        assert_eq!(got["remaining"], json!(2));
    }

    #[tokio::test]
    async fn decrement_rejects_when_short() {
        let s = MemoryStorage::new();
        let id = seeded_course(&s, 2).await;
        let out = s.decrement_remaining("lesson", &id, 3).await.unwrap();
        assert_eq!(out, DecrementOutcome::Insufficient { remaining: 2 });
        let got = s.find_one("lesson", &id).await.unwrap().unwrap();
        assert_eq!(got["remaining"], json!(2));
    }

    #[tokio::test]
    async fn decrement_unknown_course() {
        let s = MemoryStorage::new();
        let out = s.decrement_remaining("lesson", "nope", 1).await.unwrap();
        assert_eq!(out, DecrementOutcome::NotFound);
        assert!(s.find_all("lesson").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn decrement_without_counter_is_inconsistent() {
        let s = MemoryStorage::new();
        let id = s
            .insert_one("lesson", doc(json!({ "subject": "Art" })))
            .await
            .unwrap();
        let out = s.decrement_remaining("lesson", &id, 1).await.unwrap();
        assert_eq!(out, DecrementOutcome::Inconsistent);
    }

    #[tokio::test]
    async fn decrement_leaves_unusable_counters_alone() {
        let s = MemoryStorage::new();
        for counter in [json!(1e19), json!(4.5)] {
            let id = s
                .insert_one("lesson", doc(json!({ "remaining": counter.clone() })))
                .await
                .unwrap();
            let out = s.decrement_remaining("lesson", &id, 1).await.unwrap();
            assert_eq!(out, DecrementOutcome::Inconsistent, "counter {counter}");
            let got = s.find_one("lesson", &id).await.unwrap().unwrap();
            assert_eq!(got["remaining"], counter);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_decrements_never_go_negative() {
        let s = Arc::new(MemoryStorage::new());
        let id = seeded_course(&s, 5).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let s = Arc::clone(&s);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                s.decrement_remaining("lesson", &id, 5).await.unwrap()
            }));
        }
        let mut applied = 0;
        for h in handles {
            if matches!(h.await.unwrap(), DecrementOutcome::Applied { .. }) {
                applied += 1;
            }
        }
        assert_eq!(applied, 1, "only one purchase of 5 fits into 5 seats");
        let got = s.find_one("lesson", &id).await.unwrap().unwrap();
        assert_eq!(got["remaining"], json!(0));
    }
}
