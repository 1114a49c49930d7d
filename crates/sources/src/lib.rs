//! Remote item fetchers.
//!
//! Each source implements [`engine_core::ItemFetcher`] and maps its transport
//! and HTTP failures onto [`engine_core::FetchError`] so the worker pool can
//! tell rate limiting apart from permanent failures.

pub mod config;
pub mod openfoodfacts;

pub use config::*;
pub use openfoodfacts::OpenFoodFactsFetcher;
