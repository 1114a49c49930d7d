//! Common test setup functions.

use engine_core::Result;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use storage::StorageConfig;
use tempfile::TempDir;
use worker::{Engine, WorkerConfig};

use crate::mocks::ScriptedFetcher;

/// Test context with input and output files in a private temp directory.
///
/// Runs the real engine against a [`ScriptedFetcher`], with intervals and
/// backoff shortened so scenarios finish in milliseconds.
pub struct TestContext {
    pub dir: TempDir,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl TestContext {
    pub fn new() -> Self {
        telemetry::init_test_tracing();

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let input_path = dir.path().join("products.json");
        let output_path = dir.path().join("products_enriched.json");
        Self {
            dir,
            input_path,
            output_path,
        }
    }

    /// Writes `products` as the input file.
    pub fn write_input(&self, products: &[Value]) {
        write_json(&self.input_path, products);
    }

    /// Writes `records` as a pre-existing checkpoint.
    pub fn write_checkpoint(&self, records: &[Value]) {
        write_json(&self.output_path, records);
    }

    pub fn write_output_raw(&self, content: &str) {
        std::fs::write(&self.output_path, content).expect("Failed to write output file");
    }

    pub fn output_raw(&self) -> String {
        std::fs::read_to_string(&self.output_path).expect("Failed to read output file")
    }

    /// Parses the output file.
    pub fn read_output(&self) -> Vec<Value> {
        serde_json::from_str(&self.output_raw()).expect("Output is not a JSON list")
    }

    pub fn output_exists(&self) -> bool {
        self.output_path.exists()
    }

    /// Worker settings scaled down for tests.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            num_workers: 4,
            checkpoint_interval_ms: 50,
            initial_backoff_ms: 10,
            max_backoff_ms: 80,
            ..Default::default()
        }
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig {
            input_path: self.input_path.clone(),
            output_path: self.output_path.clone(),
        }
    }

    /// Engine with test worker settings and the given fetcher.
    pub fn engine(&self, fetcher: &ScriptedFetcher) -> Engine {
        self.engine_with(self.worker_config(), fetcher)
            .expect("Failed to create engine")
    }

    pub fn engine_with(&self, worker: WorkerConfig, fetcher: &ScriptedFetcher) -> Result<Engine> {
        Engine::new(worker, self.storage_config(), Arc::new(fetcher.clone()))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

fn write_json(path: &std::path::Path, values: &[Value]) {
    let content = serde_json::to_string_pretty(values).expect("Failed to serialize fixture");
    std::fs::write(path, content).expect("Failed to write fixture");
}
