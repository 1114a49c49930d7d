//! Storage configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where records are read from and written to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Input file (JSON array of records)
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,
    /// Output file, also used as the checkpoint
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

fn default_input_path() -> PathBuf {
    PathBuf::from("data/products.json")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("data/products_enriched.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
        }
    }
}
