//! Shared helpers for the storefront conformance test suite.
//!
//! Provides [`spawn_server`], which binds a `TcpListener` on an ephemeral
//! port, wires up an in-process server backed by `MemoryStorage`, and returns
//! both the local URL and the underlying storage so tests can seed lessons
//! without going through the HTTP layer (lessons have no create route).

use std::sync::Arc;

use serde_json::Value;
use storefront_api::Document;
use tutoring_server::{build_router, config::ServerConfig, MemoryStorage, Storage};

/// Start an ephemeral in-process server and return `(base_url, storage)`.
///
/// The server runs in a background `tokio` task bound to an OS-assigned port
/// on `127.0.0.1`, with the default `lesson,orders` allow-list and CORS open
/// to any origin.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the server fails to start.
pub async fn spawn_server() -> (String, Arc<MemoryStorage>) {
    spawn_server_with(ServerConfig::for_tests()).await
}

/// Like [`spawn_server`], with a caller-supplied configuration.
pub async fn spawn_server_with(mut config: ServerConfig) -> (String, Arc<MemoryStorage>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    config.bind_addr = addr;

    let mem_storage = Arc::new(MemoryStorage::new());
    let storage: Arc<dyn Storage> = Arc::clone(&mem_storage) as Arc<dyn Storage>;
    let router = build_router(storage, config);

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance server error");
    });

    (format!("http://{addr}"), mem_storage)
}

/// Insert a lesson directly into storage and return its id.
pub async fn seed_lesson(storage: &MemoryStorage, lesson: Value) -> String {
    let doc: Document = lesson
        .as_object()
        .cloned()
        .expect("lesson must be a JSON object");
    storage
        .insert_one("lesson", doc)
        .await
        .expect("seed lesson")
}
