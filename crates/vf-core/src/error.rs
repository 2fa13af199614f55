//! Unified error type for vidforge.
//!
//! All crates funnel their failures into [`Error`]. The variants follow the
//! failure taxonomy of a batch run: setup failures ([`Error::EncoderUnavailable`],
//! [`Error::Validation`], [`Error::Config`]),
//! traversal failures ([`Error::Traversal`]), and per-job tool failures
//! ([`Error::Tool`]).

use std::path::PathBuf;

/// Unified error type covering all failure modes in vidforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg) failed to start, failed while running, or
    /// exited unsuccessfully.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// The configured encoder is not in the encoder's capability listing.
    #[error("Encoder '{codec}' is not available; choose another encoder")]
    EncoderUnavailable {
        /// The codec name that was requested.
        codec: String,
    },

    /// Walking the target directory failed.
    #[error("Traversal error at {}: {message}", path.display())]
    Traversal {
        /// The path being visited when the walk failed.
        path: PathBuf,
        /// Human-readable error description.
        message: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),

    /// Encode parameters are unusable (for example an empty codec name).
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Traversal`].
    pub fn traversal(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Traversal {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error must stop the whole batch rather than a single job.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::EncoderUnavailable { .. }
                | Error::Traversal { .. }
                | Error::Config(_)
                | Error::Validation(_)
        )
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
