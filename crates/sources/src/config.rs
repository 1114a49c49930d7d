//! Source configuration.

use serde::{Deserialize, Serialize};

/// OpenFoodFacts client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenFoodFactsConfig {
    /// Product endpoint, the barcode is appended as `/{barcode}.json`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://world.openfoodfacts.org/api/v2/product".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    "ProductEnricher/1.0 (Educational Project)".to_string()
}

impl Default for OpenFoodFactsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}
