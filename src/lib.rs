//! vidforge: batch video re-encoding through ffmpeg.
//!
//! The heavy lifting (encoder supervision, stderr draining, progress parsing)
//! lives in `vf-av`; this crate adds the batch driver, config file lookup and
//! terminal reporting used by the `vidforge` binary.

pub mod batch;
pub mod config;
pub mod console;
