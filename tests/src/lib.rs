//! Shared helpers for the engine integration tests.

pub mod fixtures;
pub mod logs;
pub mod setup;
