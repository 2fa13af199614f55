//! # vf-av
//!
//! External encoder management for vidforge.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache the path to ffmpeg.
//! - **Command execution** ([`ToolCommand`]) -- async builder for captured,
//!   time-limited queries and for long-running encodes with piped stderr.
//! - **Capability check** ([`check_encoder`]) -- confirm the configured codec is
//!   offered by `ffmpeg -encoders`.
//! - **Progress parsing** ([`parse_progress`]) -- decode elapsed/duration fields
//!   from diagnostic lines.
//! - **Stream draining** ([`spawn_drain`]) -- background task that forwards every
//!   stderr line to a [`DrainSink`].
//! - **Supervision** ([`Supervisor`]) -- one encode from spawn to [`vf_core::JobOutcome`].

pub mod command;
pub mod drain;
pub mod encoders;
pub mod progress;
pub mod supervisor;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use drain::{spawn_drain, DrainHandle, DrainReport, DrainSink};
pub use encoders::{check_encoder, listing_supports, EncoderMatch};
pub use progress::{parse_progress, ProgressSample};
pub use supervisor::{encode_args, JobState, SupervisedJob, Supervisor};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, FFMPEG};
