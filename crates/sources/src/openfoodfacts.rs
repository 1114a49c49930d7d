//! OpenFoodFacts barcode lookup.
//!
//! Output keys and number formatting follow the Czech labels used by the
//! retailer enrichers, so records from every source share one shape.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use engine_core::{EnrichmentPayload, FetchError, ItemFetcher, Record};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::OpenFoodFactsConfig;

/// Fields searched for a barcode, in order.
pub const BARCODE_FIELDS: [&str; 4] = ["barcode", "ean", "gtin", "ean13"];

const INGREDIENT_FIELDS: [&str; 4] = [
    "ingredients_text_cs",
    "ingredients_text_sk",
    "ingredients_text_en",
    "ingredients_text",
];

const CONTAINS: &str = "Obsahuje";
const MAY_CONTAIN: &str = "Může obsahovat";

/// Fetches nutrition, allergens, and ingredients by barcode.
pub struct OpenFoodFactsFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsFetcher {
    pub fn new(config: &OpenFoodFactsConfig) -> engine_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                engine_core::Error::configuration(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn product_url(&self, barcode: &str) -> String {
        format!("{}/{}.json", self.base_url, barcode)
    }
}

#[async_trait]
impl ItemFetcher for OpenFoodFactsFetcher {
    async fn fetch(&self, record: &Record) -> Result<EnrichmentPayload, FetchError> {
        let barcode = barcode_of(record)
            .ok_or_else(|| FetchError::MissingPrecondition("product has no barcode".into()))?;

        let url = self.product_url(&barcode);
        debug!(barcode = %barcode, url = %url, "Fetching product from OpenFoodFacts");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, &barcode));
        }

        let body: Value = response.json().await.map_err(transport_error)?;
        parse_response(&body, &barcode)
    }

    fn name(&self) -> &str {
        "openfoodfacts"
    }
}

fn status_error(status: reqwest::StatusCode, barcode: &str) -> FetchError {
    FetchError::from_status(status.as_u16(), format!("{} for barcode {}", status, barcode))
}

/// Maps reqwest failures without leaking the request URL, and with it the
/// barcode, into the error text.
fn transport_error(e: reqwest::Error) -> FetchError {
    let e = e.without_url();
    if let Some(status) = e.status() {
        return FetchError::from_status(status.as_u16(), e.to_string());
    }
    if e.is_timeout() || e.is_connect() {
        FetchError::Unavailable(e.to_string())
    } else if e.is_decode() {
        FetchError::Malformed(e.to_string())
    } else {
        FetchError::Other(format!("failed to fetch from OpenFoodFacts: {}", e))
    }
}

/// Digits of the first barcode-like field, if any.
pub fn barcode_of(record: &Record) -> Option<String> {
    BARCODE_FIELDS.iter().find_map(|field| {
        let raw = match record.get(*field)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        (!digits.is_empty()).then_some(digits)
    })
}

/// Converts an API v2 product response into an enrichment payload.
pub fn parse_response(body: &Value, barcode: &str) -> Result<EnrichmentPayload, FetchError> {
    if body.get("status").and_then(Value::as_i64) != Some(1) {
        return Err(FetchError::NotFound(format!(
            "product not found in OpenFoodFacts: {}",
            barcode
        )));
    }

    let empty = Map::new();
    let product = body.get("product").and_then(Value::as_object).unwrap_or(&empty);

    Ok(EnrichmentPayload {
        nutrition: extract_nutrition(product),
        allergies: extract_allergens(product),
        ingredients: extract_ingredients(product),
        extra: Map::new(),
    })
}

fn extract_nutrition(product: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    let Some(nutriments) = product.get("nutriments").and_then(Value::as_object) else {
        return out;
    };
    if nutriments.is_empty() {
        return out;
    }

    let per = product
        .get("nutrition_data_per")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("100g");
    out.insert("Výživové údaje na".into(), per.into());

    let number = |key: &str| nutriments.get(key).and_then(as_number);

    if let Some(kj) = number("energy-kj_100g").or_else(|| number("energy_100g")) {
        out.insert(
            "Energetická hodnota kJ".into(),
            format!("{} kJ", group_thousands(kj as i64)).into(),
        );
    }
    if let Some(kcal) = number("energy-kcal_100g") {
        out.insert(
            "Energetická hodnota kcal".into(),
            format!("{} kcal", group_thousands(kcal as i64)).into(),
        );
    }

    let grams: [(&str, &str, usize); 7] = [
        ("fat_100g", "Tuky", 1),
        ("saturated-fat_100g", "z toho nasycené mastné kyseliny", 1),
        ("carbohydrates_100g", "Sacharidy", 1),
        ("sugars_100g", "z toho cukry", 1),
        ("proteins_100g", "Bílkoviny", 1),
        ("salt_100g", "Sůl", 2),
        ("fiber_100g", "Vláknina", 1),
    ];
    for (key, label, precision) in grams {
        if let Some(value) = number(key) {
            out.insert(label.into(), format_grams(value, precision).into());
        }
    }

    out
}

fn extract_allergens(product: &Map<String, Value>) -> Map<String, Value> {
    let mut contains: BTreeSet<String> = tag_names(product.get("allergens_tags")).collect();
    let may_contain: BTreeSet<String> = tag_names(product.get("traces_tags")).collect();

    if contains.is_empty() {
        if let Some(text) = product.get("allergens").and_then(Value::as_str) {
            contains.extend(
                text.split([',', ';'])
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| match part.split_once(':') {
                        Some((_, name)) => capitalize(name.trim()),
                        None => capitalize(part),
                    })
                    .filter(|name| !name.is_empty()),
            );
        }
    }

    let mut out = Map::new();
    out.insert(CONTAINS.into(), to_array(contains));
    out.insert(MAY_CONTAIN.into(), to_array(may_contain));
    out
}

fn extract_ingredients(product: &Map<String, Value>) -> Option<String> {
    let text = INGREDIENT_FIELDS
        .iter()
        .filter_map(|field| product.get(*field).and_then(Value::as_str))
        .find(|s| !s.is_empty())?;

    let cleaned = ["<strong>", "</strong>", "<b>", "</b>"]
        .iter()
        .fold(text.to_string(), |acc, tag| acc.replace(tag, ""));
    let cleaned = cleaned.trim();

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// `en:milk` / `en:soy-beans` style tags to display names.
fn tag_names(tags: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    tags.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter(|tag| !tag.is_empty())
        .map(|tag| match tag.split_once(':') {
            Some((_, name)) => capitalize(&name.replace('-', " ")),
            None => capitalize(tag),
        })
}

fn to_array(names: BTreeSet<String>) -> Value {
    Value::Array(names.into_iter().map(Value::String).collect())
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `1234567` -> `1 234 567`.
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// `25.04` with precision 1 -> `25,0 g`.
fn format_grams(value: f64, precision: usize) -> String {
    format!("{:.*} g", precision, value).replace('.', ",")
}
