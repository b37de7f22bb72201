//! Schema-flexible documents as stored in a collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// A JSON object as held by the document store.
///
/// The identifier lives under [`ID_FIELD`] and is always rendered as a string.
pub type Document = Map<String, Value>;

/// Name of the identifier field on every stored document.
pub const ID_FIELD: &str = "_id";

/// Name of the seat counter on lesson documents.
pub const REMAINING_FIELD: &str = "remaining";

// 2^63: the first float that no longer fits in an i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Body of `PUT /collections/{collection_name}/{id}`: top-level fields to set.
///
/// Fields not named are left untouched. A `null` value stores `null`, it does
/// not remove the field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FieldUpdate(pub Document);

impl FieldUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            return Err(ValidationError::EmptyBody);
        }
        if self.0.contains_key(ID_FIELD) {
            return Err(ValidationError::ClientSuppliedId);
        }
        Ok(())
    }

    pub fn into_inner(self) -> Document {
        self.0
    }
}

/// Read an integer seat counter from `doc`, if present and integral.
///
/// Whole-valued floats are accepted since some drivers store every number as
/// a double. Floats outside the `i64` range are not a usable counter.
pub fn remaining_of(doc: &Document) -> Option<i64> {
    match doc.get(REMAINING_FIELD)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(f))
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn update_rejects_id_and_empty_bodies() {
        let with_id: FieldUpdate = serde_json::from_value(json!({ "_id": "x", "a": 1 })).unwrap();
        assert_eq!(with_id.validate(), Err(ValidationError::ClientSuppliedId));

        let empty: FieldUpdate = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.validate(), Err(ValidationError::EmptyBody));

        let ok: FieldUpdate = serde_json::from_value(json!({ "price": 12 })).unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn update_must_be_an_object() {
        assert!(serde_json::from_value::<FieldUpdate>(json!([1, 2])).is_err());
    }

    #[test]
    fn remaining_reads_integers_and_whole_floats() {
        assert_eq!(remaining_of(&doc(json!({ "remaining": 5 }))), Some(5));
        assert_eq!(remaining_of(&doc(json!({ "remaining": 4.0 }))), Some(4));
        assert_eq!(remaining_of(&doc(json!({ "remaining": 4.5 }))), None);
        assert_eq!(remaining_of(&doc(json!({ "remaining": "5" }))), None);
        assert_eq!(remaining_of(&doc(json!({ "subject": "Maths" }))), None);
    }

    #[test]
    fn remaining_outside_i64_range_is_unusable() {
        assert_eq!(remaining_of(&doc(json!({ "remaining": 1e19 }))), None);
        assert_eq!(remaining_of(&doc(json!({ "remaining": -1e19 }))), None);
        assert_eq!(
            remaining_of(&doc(json!({ "remaining": 9_223_372_036_854_775_808.0_f64 }))),
            None
        );
        assert_eq!(
            remaining_of(&doc(json!({ "remaining": 4_503_599_627_370_496.0_f64 }))),
            Some(4_503_599_627_370_496)
        );
        assert_eq!(
            remaining_of(&doc(json!({ "remaining": i64::MAX }))),
            Some(i64::MAX)
        );
    }
}
