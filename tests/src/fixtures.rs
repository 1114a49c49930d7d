//! Test fixtures and product generators.

use engine_core::{EnrichmentPayload, Record};
use serde_json::{json, Value};

/// A bare input product identified by `url`.
pub fn product(url: &str) -> Value {
    json!({
        "url": url,
        "name": format!("Product {url}"),
        "barcode": "8594001021500"
    })
}

/// N input products with urls `p0..pN`.
pub fn products(n: usize) -> Vec<Value> {
    (0..n).map(|i| product(&format!("p{i}"))).collect()
}

/// The payload the scripted fetcher returns for `identity` by default.
pub fn payload_for(identity: &str) -> EnrichmentPayload {
    let mut payload = EnrichmentPayload::default();
    payload
        .nutrition
        .insert("Energetická hodnota kcal".into(), json!("250 kcal"));
    payload.allergies.insert("Obsahuje".into(), json!(["Milk"]));
    payload.ingredients = Some(format!("ingredients of {identity}"));
    payload
}

/// `product(url)` as enriched by the default scripted payload.
pub fn enriched(url: &str) -> Value {
    Value::Object(payload_for(url).merge_into(&record(product(url))))
}

/// `product(url)` merged with the empty placeholder.
pub fn placeholder(url: &str) -> Value {
    let mut value = product(url);
    value["nutrition"] = json!({});
    value["allergies"] = json!({});
    value["ingredients"] = Value::Null;
    value
}

/// Unwraps a JSON object into a record.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// The `url` of every record, in order.
pub fn urls(records: &[Value]) -> Vec<String> {
    records
        .iter()
        .map(|r| r["url"].as_str().unwrap_or_default().to_string())
        .collect()
}
