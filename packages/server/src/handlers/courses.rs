//! Seat purchase handler: `PUT /courses/{course_id}`.
//!
//! The sufficiency check and the decrement are a single conditional store
//! operation ([`Storage::decrement_remaining`]), so concurrent purchases
//! cannot push a course's `remaining` below zero.
//!
//! [`Storage::decrement_remaining`]: crate::storage::Storage::decrement_remaining

use axum::extract::{Path, State};
use storefront_api::{AvailabilityRequest, MessageResponse};

use crate::{
    error::AppError,
    json::{Payload, PrettyJson},
    storage::DecrementOutcome,
};

use super::{lessons::LESSON_COLLECTION, AppState};

/// `PUT /courses/{course_id}`: take `quantity` seats from a course.
///
/// | Outcome | Status |
/// |---------|--------|
/// | seats taken | 200 |
/// | unknown course | 404 |
/// | not enough seats, or invalid quantity | 400 |
/// | counter missing or unusable | 500 |
pub async fn update_availability(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Payload(request): Payload<AvailabilityRequest>,
) -> Result<PrettyJson<MessageResponse>, AppError> {
    request.validate()?;

    let outcome = state
        .storage
        .decrement_remaining(LESSON_COLLECTION, &course_id, i64::from(request.quantity))
        .await
        .map_err(|e| {
            tracing::error!("error updating course availability: {e}");
            AppError::Internal("An error occurred while updating course availability".into())
        })?;

    match outcome {
        DecrementOutcome::Applied { remaining } => {
            tracing::info!(
                course_id = %course_id,
                quantity = request.quantity,
                remaining,
                "course availability updated"
            );
            Ok(PrettyJson(MessageResponse::new(
                "Course availability updated successfully",
            )))
        }
        DecrementOutcome::NotFound => Err(AppError::NotFound("Course not found".into())),
        DecrementOutcome::Insufficient { remaining } => {
            tracing::debug!(
                course_id = %course_id,
                requested = request.quantity,
                remaining,
                "purchase rejected: not enough seats"
            );
            Err(AppError::BadRequest("Not enough available spots".into()))
        }
        DecrementOutcome::Inconsistent => {
            tracing::warn!(
                course_id = %course_id,
                "course has no usable remaining counter"
            );
            Err(AppError::Internal(
                "Failed to update course availability".into(),
            ))
        }
    }
}
