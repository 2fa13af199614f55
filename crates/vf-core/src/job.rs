//! Encode job model.
//!
//! An [`EncodeJob`] is built once per source file by the batch driver and
//! handed to the supervisor, which turns it into a [`JobOutcome`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::media::output_path_for;
use crate::Error;

/// Encoder parameters shared by every job in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeParams {
    /// Encoder name passed to `-c:v` (e.g. `hevc`, `h264`, `vp9`).
    pub codec: String,
    /// Encoder preset passed to `-preset`.
    pub preset: String,
    /// Constant rate factor passed to `-crf`.
    pub crf: u32,
    /// Encoder thread count; 0 lets the encoder decide.
    pub threads: u32,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            codec: "hevc".to_string(),
            preset: "medium".to_string(),
            crf: 28,
            threads: 0,
        }
    }
}

impl EncodeParams {
    /// Reject parameters that cannot form an encoder invocation.
    ///
    /// Only emptiness is checked. Unknown codec or preset names are left to
    /// the encoder's own capability listing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the codec or preset is empty.
    pub fn validate(&self) -> crate::Result<()> {
        if self.codec.trim().is_empty() {
            return Err(Error::Validation("encoder codec must not be empty".into()));
        }
        if self.preset.trim().is_empty() {
            return Err(Error::Validation("encoder preset must not be empty".into()));
        }
        Ok(())
    }
}

/// One source-file-to-output-file encode request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    source: PathBuf,
    output: PathBuf,
    subtitle: Option<PathBuf>,
    params: EncodeParams,
}

impl EncodeJob {
    /// Build a job for `source`, deriving the output path from the codec.
    pub fn new(source: impl Into<PathBuf>, params: EncodeParams, subtitle: Option<PathBuf>) -> Self {
        let source = source.into();
        let output = output_path_for(&source, &params.codec);
        Self {
            source,
            output,
            subtitle,
            params,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn subtitle(&self) -> Option<&Path> {
        self.subtitle.as_deref()
    }

    pub fn params(&self) -> &EncodeParams {
        &self.params
    }
}

impl fmt::Display for EncodeJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.display(), self.output.display())
    }
}

/// Result of running one [`EncodeJob`] to completion.
#[derive(Debug)]
pub struct JobOutcome {
    pub source: PathBuf,
    pub output: PathBuf,
    /// The underlying failure, if the job did not succeed.
    pub error: Option<Error>,
}

impl JobOutcome {
    pub fn succeeded(job: &EncodeJob) -> Self {
        Self {
            source: job.source.clone(),
            output: job.output.clone(),
            error: None,
        }
    }

    pub fn failed(job: &EncodeJob, error: Error) -> Self {
        Self {
            source: job.source.clone(),
            output: job.output.clone(),
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}
