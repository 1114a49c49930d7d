//! Product records and enrichment payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An opaque product record as read from the input file.
///
/// Enrichment results use the same shape: the input fields plus the
/// enrichment fields.
pub type Record = Map<String, Value>;

pub const NUTRITION_FIELD: &str = "nutrition";
pub const ALLERGIES_FIELD: &str = "allergies";
pub const INGREDIENTS_FIELD: &str = "ingredients";

/// Supplementary attributes fetched for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentPayload {
    #[serde(default)]
    pub nutrition: Map<String, Value>,
    #[serde(default)]
    pub allergies: Map<String, Value>,
    #[serde(default)]
    pub ingredients: Option<String>,
    /// Free-form extension fields (e.g. `description`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EnrichmentPayload {
    /// Empty nutrition and allergies, null ingredients.
    pub fn placeholder() -> Self {
        Self::default()
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether this payload carries no enrichment data at all.
    pub fn is_placeholder(&self) -> bool {
        self.nutrition.is_empty()
            && self.allergies.is_empty()
            && self.ingredients.is_none()
            && self.extra.is_empty()
    }

    /// Merges the payload over the given record.
    ///
    /// Record fields come first; payload fields overwrite same-named ones.
    pub fn merge_into(self, record: &Record) -> Record {
        let mut merged = record.clone();
        merged.insert(NUTRITION_FIELD.to_string(), Value::Object(self.nutrition));
        merged.insert(ALLERGIES_FIELD.to_string(), Value::Object(self.allergies));
        merged.insert(
            INGREDIENTS_FIELD.to_string(),
            self.ingredients.map(Value::String).unwrap_or(Value::Null),
        );
        for (key, value) in self.extra {
            merged.insert(key, value);
        }
        merged
    }
}

/// The record merged with an empty-enrichment placeholder.
pub fn placeholder_for(record: &Record) -> Record {
    EnrichmentPayload::placeholder().merge_into(record)
}
