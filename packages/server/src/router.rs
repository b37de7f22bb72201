//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    handlers::{collections, courses, lessons, orders, AppState},
    middleware::{cors::cors_layer, recover},
    storage::Storage,
};

/// Build the complete application router with shared state.
pub fn build_router(storage: Arc<dyn Storage>, config: ServerConfig) -> Router {
    let cors = cors_layer(&config.cors_origins);
    let state = AppState {
        storage,
        config: Arc::new(config),
    };

    Router::new()
        // Lesson catalogue (takes precedence over the generic collection route)
        .route("/collections/lesson", get(lessons::list))
        // Generic collections
        .route("/collections/{collection_name}", get(collections::list))
        .route(
            "/collections/{collection_name}/{id}",
            get(collections::get_by_id)
                .put(collections::update)
                .delete(collections::remove),
        )
        // Orders
        .route("/orders", post(orders::create))
        // Seat purchases
        .route("/courses/{course_id}", put(courses::update_availability))
        .fallback(recover::not_found)
        .method_not_allowed_fallback(recover::method_not_allowed)
        .with_state(state)
        .layer(CatchPanicLayer::custom(recover::handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
