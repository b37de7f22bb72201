//! Course purchase types (`PUT /courses/{course_id}`).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The request body for `PUT /courses/{course_id}`.
///
/// ```json
/// { "quantity": 2 }
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityRequest {
    /// Number of seats being bought. Must be at least 1.
    pub quantity: u32,
}

impl AvailabilityRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.quantity == 0 {
            return Err(ValidationError::NonPositiveQuantity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_quantity_is_rejected() {
        let req = AvailabilityRequest { quantity: 0 };
        assert_eq!(req.validate(), Err(ValidationError::NonPositiveQuantity));
        assert!(AvailabilityRequest { quantity: 3 }.validate().is_ok());
    }

    #[test]
    fn negative_or_fractional_quantities_do_not_parse() {
        assert!(serde_json::from_value::<AvailabilityRequest>(json!({ "quantity": -1 })).is_err());
        assert!(serde_json::from_value::<AvailabilityRequest>(json!({ "quantity": 1.5 })).is_err());
        assert!(serde_json::from_value::<AvailabilityRequest>(json!({})).is_err());
    }
}
