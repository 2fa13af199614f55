//! Static media tables: recognised file extensions, encoder names, and presets.
//!
//! Extensions are stored lowercase without the leading dot; lookups compare
//! case-insensitively.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Video container extensions picked up by a batch walk.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm"];

/// Sidecar subtitle extensions, in lookup order.
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "sub", "idx"];

/// Encoder names documented in the CLI help. Not enforced; the encoder's own
/// capability listing is the authority.
pub const KNOWN_CODECS: &[&str] = &["hevc", "hevc_qsv", "hevc_amf", "hevc_nvenc", "h264", "vp9"];

/// x264/x265 preset names.
pub const KNOWN_PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// Container extension of every encode output.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Lowercased extension of `path`, if it has one.
fn lower_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Whether `path` has a recognised video extension (case-insensitive).
pub fn is_video_file(path: &Path) -> bool {
    lower_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Derive the output path for `source`: `<source without extension>_<codec>.mp4`.
///
/// The stem is copied as raw OS bytes, so names that are not valid UTF-8
/// survive unchanged.
pub fn output_path_for(source: &Path, codec: &str) -> PathBuf {
    let mut name = OsString::new();
    if let Some(stem) = source.file_stem() {
        name.push(stem);
    }
    name.push(format!("_{codec}.{OUTPUT_EXTENSION}"));
    source.with_file_name(name)
}

/// Find a subtitle file sharing `source`'s stem.
///
/// Extensions are tried in [`SUBTITLE_EXTENSIONS`] order; the first file that
/// exists wins.
pub fn find_subtitle(source: &Path) -> Option<PathBuf> {
    SUBTITLE_EXTENSIONS
        .iter()
        .map(|ext| source.with_extension(ext))
        .find(|candidate| candidate.is_file())
}
