//! SQLite-backed storage implementation.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! A single `documents` table holds every collection. Each row keeps the full
//! JSON document in `data`; `seq` preserves insertion order for listing. The
//! seat counter is manipulated in place with SQLite's JSON functions so the
//! conditional decrement is one `UPDATE` statement.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use storefront_api::{remaining_of, Document};

use super::{take_or_assign_id, DecrementOutcome, Storage, StorageError};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    collection  TEXT NOT NULL,
    id          TEXT NOT NULL,
    data        TEXT NOT NULL,
    UNIQUE (collection, id)
);
CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq);
";

// Only whole-number counters qualify; the new value is returned so callers
// never need a second read on success.
const DECREMENT_SQL: &str = "
UPDATE documents
   SET data = json_set(data, '$.remaining',
                       CAST(json_extract(data, '$.remaining') AS INTEGER) - ?3)
 WHERE collection = ?1
   AND id = ?2
   AND json_type(data, '$.remaining') IN ('integer', 'real')
   AND json_extract(data, '$.remaining') = CAST(json_extract(data, '$.remaining') AS INTEGER)
   AND json_extract(data, '$.remaining') >= ?3
RETURNING CAST(json_extract(data, '$.remaining') AS INTEGER)
";

// ---------------------------------------------------------------------------
// SqliteStorage
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`Storage`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn);
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("task join error: {e}")))?
    }
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|p| p.into_inner())
}

// ---------------------------------------------------------------------------
// Error conversions
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

fn map_json_err(e: serde_json::Error) -> StorageError {
    StorageError::Internal(format!("JSON error: {e}"))
}

fn load(conn: &Connection, collection: &str, id: &str) -> Result<Option<Document>, StorageError> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
            |row| row.get(0),
        )
        .optional()
        .map_err(map_err)?;
    data.map(|d| serde_json::from_str(&d).map_err(map_json_err))
        .transpose()
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for SqliteStorage {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>, StorageError> {
        let collection = collection.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare("SELECT data FROM documents WHERE collection = ?1 ORDER BY seq")
                .map_err(map_err)?;
            let rows = stmt
                .query_map(params![collection], |row| row.get::<_, String>(0))
                .map_err(map_err)?;
            let mut docs = Vec::new();
            for row in rows {
                let data = row.map_err(map_err)?;
                docs.push(serde_json::from_str(&data).map_err(map_json_err)?);
            }
            Ok(docs)
        })
        .await
    }

    async fn find_one(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StorageError> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.with_conn(move |conn| load(conn, &collection, &id)).await
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> Result<String, StorageError> {
        let id = take_or_assign_id(&mut doc)?;
        let data = serde_json::to_string(&doc).map_err(map_json_err)?;
        let collection = collection.to_string();

        self.with_conn(move |conn| {
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| row.get::<_, i64>(0),
                )
                .map_err(map_err)?
                > 0;

            if exists {
                return Err(StorageError::Conflict(format!(
                    "document {id} already exists in {collection}"
                )));
            }

            conn.execute(
                "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
                params![collection, id, data],
            )
            .map_err(map_err)?;
            Ok(id)
        })
        .await
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<bool, StorageError> {
        let collection = collection.to_string();
        let id = id.to_string();

        // Read-modify-write is safe: the connection mutex is held throughout.
        self.with_conn(move |conn| {
            let Some(mut doc) = load(conn, &collection, &id)? else {
                return Ok(false);
            };
            doc.extend(fields);
            let data = serde_json::to_string(&doc).map_err(map_json_err)?;
            conn.execute(
                "UPDATE documents SET data = ?3 WHERE collection = ?1 AND id = ?2",
                params![collection, id, data],
            )
            .map_err(map_err)?;
            Ok(true)
        })
        .await
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        let collection = collection.to_string();
        let id = id.to_string();
        self.with_conn(move |conn| {
            let n = conn
                .execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                )
                .map_err(map_err)?;
            Ok(n > 0)
        })
        .await
    }

    async fn decrement_remaining(
        &self,
        collection: &str,
        id: &str,
        quantity: i64,
    ) -> Result<DecrementOutcome, StorageError> {
        let collection = collection.to_string();
        let id = id.to_string();

        self.with_conn(move |conn| {
            let updated: Option<i64> = conn
                .query_row(DECREMENT_SQL, params![collection, id, quantity], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(map_err)?;

            if let Some(remaining) = updated {
                return Ok(DecrementOutcome::Applied { remaining });
            }

            // Nothing matched; work out why while still holding the lock.
            Ok(match load(conn, &collection, &id)? {
                None => DecrementOutcome::NotFound,
                Some(doc) => match remaining_of(&doc) {
                    Some(remaining) if remaining < quantity => {
                        DecrementOutcome::Insufficient { remaining }
                    }
                    _ => DecrementOutcome::Inconsistent,
                },
            })
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
