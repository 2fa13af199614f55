use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use vidforge::config::Config;

#[derive(Parser)]
#[command(name = "vidforge")]
#[command(author, version, about = "Batch video re-encoding through ffmpeg")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-encode every video file under a folder
    Encode(EncodeArgs),

    /// Check that ffmpeg is available
    CheckTools {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether ffmpeg offers an encoder
    Encoders {
        /// Encoder name (defaults to the configured codec)
        codec: Option<String>,

        /// Require an exact encoder-name match instead of a substring match
        #[arg(long)]
        strict: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Args, Debug, Default)]
pub struct EncodeArgs {
    /// Folder to convert (defaults to the configured folder, "./")
    pub folder: Option<PathBuf>,

    /// Video quality (CRF)
    #[arg(long)]
    pub crf: Option<u32>,

    /// Encoder threads; 0 lets the encoder decide
    #[arg(long)]
    pub threads: Option<u32>,

    /// Video encoder: hevc, hevc_qsv, hevc_amf, hevc_nvenc, h264, vp9
    #[arg(long)]
    pub codec: Option<String>,

    /// Encoder preset: ultrafast, superfast, veryfast, faster, fast, medium,
    /// slow, slower, veryslow
    #[arg(long)]
    pub preset: Option<String>,

    /// Burn in a same-stem subtitle file when one exists
    #[arg(long)]
    pub subtitles: bool,

    /// Stop at the first failed file
    #[arg(long)]
    pub fail_fast: bool,

    /// Require an exact encoder-name match instead of a substring match
    #[arg(long)]
    pub strict_encoder: bool,

    /// Print the encoder commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Hide encoder output; show only progress and results
    #[arg(short, long)]
    pub quiet: bool,
}

impl EncodeArgs {
    /// Layer command-line flags over the loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref folder) = self.folder {
            config.encode.folder = folder.clone();
        }
        if let Some(crf) = self.crf {
            config.encode.crf = crf;
        }
        if let Some(threads) = self.threads {
            config.encode.threads = threads;
        }
        if let Some(ref codec) = self.codec {
            config.encode.codec = codec.clone();
        }
        if let Some(ref preset) = self.preset {
            config.encode.preset = preset.clone();
        }
        config.encode.subtitles |= self.subtitles;
        config.batch.fail_fast |= self.fail_fast;
        config.batch.strict_encoder_match |= self.strict_encoder;
    }
}
