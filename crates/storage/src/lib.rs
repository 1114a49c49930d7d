//! Input loading and checkpoint persistence.
//!
//! The output file doubles as the resumable checkpoint: the progress monitor
//! snapshots completed work into it and the finalizer overwrites it with the
//! full, input-ordered result. Every write goes through [`write_records_atomic`].

pub mod atomic;
pub mod checkpoint;
pub mod config;
pub mod input;

pub use atomic::write_records_atomic;
pub use checkpoint::*;
pub use config::*;
pub use input::load_input;
