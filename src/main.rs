//! Product Enrichment Engine
//!
//! Enriches a JSON list of products with nutrition, allergen and ingredient
//! data from OpenFoodFacts:
//! - bounded pool of fetch workers with per-item backoff on rate limiting
//! - periodic checkpoints into the output file, resumed on the next run
//! - input-ordered final output with placeholders for unfetchable products

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use sources::{OpenFoodFactsConfig, OpenFoodFactsFetcher};
use storage::StorageConfig;
use telemetry::init_tracing_from_env;
use worker::{Engine, WorkerConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default)]
    storage: StorageConfig,

    #[serde(default)]
    worker: WorkerConfig,

    #[serde(default)]
    openfoodfacts: OpenFoodFactsConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Product Enrichment Engine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    info!(
        input = %config.storage.input_path.display(),
        output = %config.storage.output_path.display(),
        workers = config.worker.num_workers,
        "Loaded configuration"
    );

    let fetcher = OpenFoodFactsFetcher::new(&config.openfoodfacts)
        .context("Failed to create OpenFoodFacts client")?;

    let engine = Engine::new(config.worker, config.storage, Arc::new(fetcher))
        .context("Invalid worker configuration")?;

    let summary = match engine.run_until(shutdown_signal()).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Enrichment run failed");
            return Err(e).context("Enrichment run failed");
        }
    };

    if summary.interrupted {
        warn!(
            enriched = summary.enriched,
            "Interrupted, progress saved; run again to resume"
        );
    } else {
        info!(
            total = summary.total_inputs,
            already_done = summary.already_done,
            enriched = summary.enriched,
            failed = summary.failed,
            placeholders = summary.placeholders,
            retries = summary.metrics.rate_limited_retries,
            "Run summary"
        );
    }

    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // e.g. ENRICHER__WORKER__NUM_WORKERS=16
        .add_source(
            config::Environment::with_prefix("ENRICHER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
