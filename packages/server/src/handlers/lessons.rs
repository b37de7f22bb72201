//! Lesson catalogue handler: `GET /collections/lesson`.

use axum::extract::State;
use storefront_api::Document;

use crate::{error::AppError, json::PrettyJson};

use super::AppState;

/// Collection holding the lesson/course documents.
pub const LESSON_COLLECTION: &str = "lesson";

/// `GET /collections/lesson`
///
/// Returns every lesson document as a JSON array, in the store's natural
/// order. No filtering or pagination.
pub async fn list(State(state): State<AppState>) -> Result<PrettyJson<Vec<Document>>, AppError> {
    let lessons = state
        .storage
        .find_all(LESSON_COLLECTION)
        .await
        .map_err(|e| {
            tracing::error!("error fetching lessons: {e}");
            AppError::Internal("An error occurred while fetching lessons".into())
        })?;
    Ok(PrettyJson(lessons))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::LESSON_COLLECTION;
    use crate::handlers::test_support::{
        assert_store_failure, build_app, build_failing_app, doc, send,
    };
    use crate::storage::Storage;

    #[tokio::test]
    async fn empty_catalogue_is_an_empty_array() {
        let (app, _storage) = build_app();
        let (status, body) = send(&app, "GET", "/collections/lesson", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn lists_every_lesson_as_stored() {
        let (app, storage) = build_app();
        let mut stored = Vec::new();
        for (subject, remaining) in [("Maths", 5), ("English", 3), ("Music", 0)] {
            let id = storage
                .insert_one(
                    LESSON_COLLECTION,
                    doc(json!({
                        "subject": subject,
                        "location": "London",
                        "price": 100,
                        "remaining": remaining
                    })),
                )
                .await
                .unwrap();
            stored.push(storage.find_one(LESSON_COLLECTION, &id).await.unwrap().unwrap());
        }

        let (status, body) = send(&app, "GET", "/collections/lesson", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 3);
        for doc in &stored {
            assert!(listed.contains(&serde_json::Value::Object(doc.clone())));
        }
    }

    #[tokio::test]
    async fn other_collections_do_not_leak_in() {
        let (app, storage) = build_app();
        storage
            .insert_one("orders", doc(json!({ "name": "Ada" })))
            .await
            .unwrap();
        let (_, body) = send(&app, "GET", "/collections/lesson", None).await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn store_failure_is_a_fixed_500() {
        let app = build_failing_app();
        let (status, body) = send(&app, "GET", "/collections/lesson", None).await;
        assert_store_failure(status, &body, "An error occurred while fetching lessons");
    }
}
