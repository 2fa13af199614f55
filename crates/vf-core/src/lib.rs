//! vf-core: shared types, errors, and configuration.
//!
//! This crate is the foundational dependency for the other vf-* crates,
//! providing a unified error type, the encode job model, the static
//! extension tables, and application configuration.

pub mod config;
pub mod error;
pub mod job;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use job::{EncodeJob, EncodeParams, JobOutcome};
