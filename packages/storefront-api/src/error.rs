//! Error and acknowledgement bodies shared by every endpoint.

use serde::{Deserialize, Serialize};

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "Course not found" }
/// ```
///
/// Only a human-readable message is exposed; there are no error codes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A plain acknowledgement, e.g. `{ "message": "Document deleted successfully" }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A request body that parsed as JSON but breaks a boundary rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("quantity must be a positive integer")]
    NonPositiveQuantity,

    #[error("_id is assigned by the server and cannot be supplied")]
    ClientSuppliedId,

    #[error("request body must not be empty")]
    EmptyBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_has_only_error_field() {
        let json = serde_json::to_value(ErrorResponse::new("Course not found")).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "Course not found" }));
    }

    #[test]
    fn validation_messages_are_readable() {
        assert_eq!(
            ValidationError::NonPositiveQuantity.to_string(),
            "quantity must be a positive integer"
        );
    }
}
