//! Identity key resolution.
//!
//! Every record is keyed by the first non-empty value among an ordered list
//! of candidate fields. Records without any such value have no identity and
//! are never deduplicated or checkpointed.

use serde_json::Value;

use crate::record::Record;

/// Default candidate fields, most canonical first.
pub const DEFAULT_IDENTITY_FIELDS: [&str; 3] = ["product_url", "url", "id"];

/// Derives identity keys from records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    fields: Vec<String>,
}

impl IdentityResolver {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the identity of `record`, or `None` if no candidate is set.
    ///
    /// Strings count when non-blank; numbers are rendered in decimal.
    pub fn resolve(&self, record: &Record) -> Option<String> {
        self.fields
            .iter()
            .filter_map(|field| record.get(field))
            .find_map(identity_value)
    }

    /// Resets every candidate field of `result` to its value in `input`.
    ///
    /// Fetched data may carry its own `product_url` or `id`; those must not
    /// replace the key the result was stored under, or a resumed run would
    /// fail to recognise it.
    pub fn restore_identity(&self, input: &Record, result: &mut Record) {
        for field in &self.fields {
            match input.get(field) {
                Some(value) => {
                    result.insert(field.clone(), value.clone());
                }
                None => {
                    result.remove(field);
                }
            }
        }
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY_FIELDS)
    }
}

fn identity_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
