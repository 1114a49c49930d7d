//! Core types for the product enrichment engine.

pub mod error;
pub mod fetch;
pub mod identity;
pub mod record;

pub use error::{Error, Result};
pub use fetch::*;
pub use identity::*;
pub use record::*;
