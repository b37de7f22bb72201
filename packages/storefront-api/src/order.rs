//! Order submission types (`POST /orders`).

use serde::{Deserialize, Serialize};

use crate::document::{Document, ID_FIELD};
use crate::error::ValidationError;

/// The request body for `POST /orders`: any JSON object.
///
/// Orders carry no fixed schema. The body must be an object and must not
/// choose its own identifier, so every accepted submission gets a fresh id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct OrderRequest(pub Document);

impl OrderRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.contains_key(ID_FIELD) {
            return Err(ValidationError::ClientSuppliedId);
        }
        Ok(())
    }

    pub fn into_document(self) -> Document {
        self.0
    }
}

/// The response body for a successful `POST /orders` (HTTP 201).
///
/// ```json
/// { "message": "Order placed successfully", "orderId": "0192f0c4..." }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub message: String,
    pub order_id: String,
}
