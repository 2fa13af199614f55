//! Encoder capability check.
//!
//! Before any job starts, the configured codec is looked up in the output of
//! `ffmpeg -encoders`. A missing codec is a fatal setup error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;

/// How a codec name is matched against the capability listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderMatch {
    /// The codec name appears anywhere in the listing text. `hevc` is then
    /// accepted by a listing that only has `hevc_nvenc`.
    #[default]
    Substring,
    /// The codec name equals the encoder-name column of some listing row.
    Exact,
}

impl EncoderMatch {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Self::Exact
        } else {
            Self::Substring
        }
    }
}

/// Whether `listing` (the stdout of `ffmpeg -encoders`) offers `codec`.
pub fn listing_supports(listing: &str, codec: &str, mode: EncoderMatch) -> bool {
    if codec.is_empty() {
        return false;
    }
    match mode {
        EncoderMatch::Substring => listing.contains(codec),
        // Rows look like ` V....D libx265              libx265 H.265 / HEVC`:
        // a six-character flag column, then the encoder name.
        EncoderMatch::Exact => listing.lines().any(|row| {
            let mut cols = row.split_whitespace();
            match (cols.next(), cols.next()) {
                (Some(flags), Some(name)) => flags.len() == 6 && name == codec,
                _ => false,
            }
        }),
    }
}

/// Run `<ffmpeg> -hide_banner -encoders` and check that `codec` is offered.
///
/// # Errors
///
/// - [`vf_core::Error::Tool`] if the listing command cannot be run.
/// - [`vf_core::Error::EncoderUnavailable`] if `codec` is not in the listing.
pub async fn check_encoder(ffmpeg: &Path, codec: &str, mode: EncoderMatch) -> vf_core::Result<()> {
    let output = ToolCommand::new(ffmpeg.to_path_buf())
        .args(["-hide_banner", "-encoders"])
        .execute()
        .await?;

    if listing_supports(&output.stdout, codec, mode) {
        tracing::debug!("Encoder {codec} is available ({mode:?} match)");
        Ok(())
    } else {
        Err(vf_core::Error::EncoderUnavailable {
            codec: codec.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Encoders:
 V..... = Video
 A..... = Audio
 S..... = Subtitle
 .F.... = Frame-level multithreading
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (codec h264)
 V....D hevc_nvenc           NVIDIA NVENC hevc encoder (codec hevc)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
";

    #[test]
    fn exact_name_found_in_both_modes() {
        assert!(listing_supports(LISTING, "hevc_nvenc", EncoderMatch::Substring));
        assert!(listing_supports(LISTING, "hevc_nvenc", EncoderMatch::Exact));
        assert!(listing_supports(LISTING, "libx264", EncoderMatch::Exact));
    }

    #[test]
    fn substring_match_accepts_codec_prefix_of_other_encoder() {
        // Known imprecision kept for compatibility: `hevc` is accepted only
        // because `hevc_nvenc` contains it.
        let listing = " V....D hevc_nvenc           NVIDIA NVENC hevc encoder\n";
        assert!(listing_supports(listing, "hevc", EncoderMatch::Substring));
        assert!(!listing_supports(listing, "hevc", EncoderMatch::Exact));
    }

    #[test]
    fn unknown_codec_rejected() {
        assert!(!listing_supports(LISTING, "prores_ks", EncoderMatch::Substring));
        assert!(!listing_supports(LISTING, "prores_ks", EncoderMatch::Exact));
    }

    #[test]
    fn exact_ignores_legend_and_descriptions() {
        // "Video" appears only in the legend; "AVC" only in a description.
        assert!(!listing_supports(LISTING, "Video", EncoderMatch::Exact));
        assert!(!listing_supports(LISTING, "AVC", EncoderMatch::Exact));
    }

    #[test]
    fn empty_codec_never_matches() {
        assert!(!listing_supports(LISTING, "", EncoderMatch::Substring));
    }

    #[test]
    fn match_mode_from_strict_flag() {
        assert_eq!(EncoderMatch::from_strict(false), EncoderMatch::Substring);
        assert_eq!(EncoderMatch::from_strict(true), EncoderMatch::Exact);
    }

    #[tokio::test]
    async fn check_encoder_missing_binary_is_tool_error() {
        let err = check_encoder(Path::new("/nonexistent/ffmpeg_xyz"), "hevc", EncoderMatch::Substring)
            .await
            .unwrap_err();
        assert!(matches!(err, vf_core::Error::Tool { .. }));
    }
}
