//! HTTP request handlers for the storefront endpoints.
//!
//! Each submodule covers one resource. Handlers are async functions that
//! receive Axum extractors and return `Result<impl IntoResponse, AppError>`.
//! Store failures are logged here and mapped to a fixed client message;
//! nothing is retried.

pub mod collections;
pub mod courses;
pub mod lessons;
pub mod orders;

use std::sync::Arc;

use crate::{config::ServerConfig, storage::Storage};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
///
/// The store handle is created once at startup and lives as long as the
/// router; handlers never reach for a global connection.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Arc<ServerConfig>,
}
