//! `tutor-server`: HTTP API for the tutoring storefront.
//!
//! # Quick start
//!
//! ```sh
//! # In-memory store on the default port, seeded with lessons:
//! TUTOR_SEED_LESSONS=./lessons.json tutor-server
//!
//! # Persistent SQLite store:
//! TUTOR_SQLITE_PATH=./storefront.db tutor-server
//!
//! # MongoDB Atlas:
//! TUTOR_DB_PREFIX=mongodb+srv:// TUTOR_DB_USER=tutor TUTOR_DB_PASSWORD=secret \
//! TUTOR_DB_HOST=@cluster0.example.mongodb.net TUTOR_DB_PARAMS='/?retryWrites=true' \
//! tutor-server
//! ```
//!
//! # Environment variables
//!
//! See [`tutoring_server::config::ServerConfig::from_env`] for the full list.
//! A `.env` file in the working directory is loaded before the environment
//! is read.

use std::sync::Arc;

use tutoring_server::{
    build_router,
    config::{ServerConfig, StoreConfig},
    seed,
    storage::{memory::MemoryStorage, mongo::MongoStorage, sqlite::SqliteStorage, Storage},
};

#[tokio::main]
async fn main() {
    // A missing .env file is the normal case.
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tutoring_server=info,tutor_server=info,tower_http=debug".into()
            }),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;

    let storage: Arc<dyn Storage> = match &config.store {
        StoreConfig::Mongo(conn) => {
            tracing::info!(
                "storage: MongoDB database {} at {}{}",
                conn.database,
                conn.prefix,
                conn.host.trim_start_matches('@')
            );
            Arc::new(MongoStorage::connect(&conn.uri(), &conn.database).await?)
        }
        StoreConfig::Sqlite { path } => {
            tracing::info!("storage: SQLite at {path}");
            Arc::new(SqliteStorage::open(path)?)
        }
        StoreConfig::Memory => {
            tracing::info!("storage: in-memory (data will not survive restart)");
            Arc::new(MemoryStorage::new())
        }
    };

    if let Some(path) = &config.seed_lessons {
        seed::seed_lessons(storage.as_ref(), path).await?;
    }

    let bind_addr = config.bind_addr;
    let app = build_router(storage, config);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
