//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from TOML. Every section
//! defaults sensibly so an empty file is valid, and command-line flags are
//! layered on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::job::EncodeParams;
use crate::media::{KNOWN_CODECS, KNOWN_PRESETS};
use crate::Error;

/// Highest CRF accepted by the common software encoders.
const MAX_CRF: u32 = 63;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub encode: EncodeConfig,
    pub batch: BatchConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| Error::Config(format!("config parse error: {e}")))
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&contents)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !KNOWN_CODECS.contains(&self.encode.codec.as_str()) {
            warnings.push(format!(
                "encode.codec '{}' is not a documented encoder (documented: {})",
                self.encode.codec,
                KNOWN_CODECS.join(", ")
            ));
        }

        if !KNOWN_PRESETS.contains(&self.encode.preset.as_str()) {
            warnings.push(format!(
                "encode.preset '{}' is not a recognized preset (valid: {})",
                self.encode.preset,
                KNOWN_PRESETS.join(", ")
            ));
        }

        if self.encode.crf > MAX_CRF {
            warnings.push(format!(
                "encode.crf {} is outside the usual 0..={MAX_CRF} range",
                self.encode.crf
            ));
        }

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffmpeg_path {} does not exist; PATH will be searched",
                    p.display()
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Encode settings applied to every file in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Folder walked when none is given on the command line.
    pub folder: PathBuf,
    pub codec: String,
    pub preset: String,
    pub crf: u32,
    pub threads: u32,
    /// Burn in a same-stem subtitle file when one exists.
    pub subtitles: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        let params = EncodeParams::default();
        Self {
            folder: PathBuf::from("./"),
            codec: params.codec,
            preset: params.preset,
            crf: params.crf,
            threads: params.threads,
            subtitles: false,
        }
    }
}

impl EncodeConfig {
    /// The encoder parameters carried by every job.
    pub fn params(&self) -> EncodeParams {
        EncodeParams {
            codec: self.codec.clone(),
            preset: self.preset.clone(),
            crf: self.crf,
            threads: self.threads,
        }
    }
}

/// Batch-level behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Stop the batch at the first failed job instead of continuing.
    pub fail_fast: bool,
    /// Match the codec against encoder names exactly instead of by substring.
    pub strict_encoder_match: bool,
}

/// External tool path overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
}
