//! Application-boundary error responder.
//!
//! Anything a handler does not turn into an [`AppError`] itself ends up
//! here: panics caught by [`tower_http::catch_panic`], requests for paths
//! that do not exist, and methods a path does not support. All of them get
//! the same `{ "error": ... }` body as handler errors.

use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::{AppError, GENERIC_ERROR};

/// `CatchPanicLayer` callback: log the panic and answer with a generic 500.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!("unhandled error in request handler: {detail}");
    AppError::Internal(GENERIC_ERROR.into()).into_response()
}

/// Router fallback for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}

/// Router fallback for a known path hit with an unsupported method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
