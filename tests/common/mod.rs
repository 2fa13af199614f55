//! Shared test harness for integration tests.
//!
//! Provides a fake `ffmpeg` shell script that answers `-encoders` and
//! `-version` queries and simulates encodes: it writes progress lines to
//! stderr, creates the output file, and fails for inputs that do not exist or
//! whose name contains `broken`.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const FAKE_FFMPEG: &str = r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo "ffmpeg version 9.9-fake"
  exit 0
fi
if [ "$1" = "-hide_banner" ] && [ "$2" = "-encoders" ]; then
  cat <<'LIST'
Encoders:
 V..... = Video
 ------
 V....D libx264              libx264 H.264 / AVC (codec h264)
 V....D hevc_nvenc           NVIDIA NVENC hevc encoder (codec hevc)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
LIST
  exit 0
fi
for last; do :; done
case "$2" in
  *broken*)
    echo "$2: Invalid data found when processing input" >&2
    exit 1
    ;;
esac
if [ ! -e "$2" ]; then
  echo "$2: No such file or directory" >&2
  exit 1
fi
echo "Input #0, from '$2':" >&2
echo "frame=10 fps=5 time=00:00:15.00 duration=60.0" >&2
echo "frame=20 fps=5 time=00:00:45.00 duration=60.0" >&2
: > "$last"
echo "video:10kB audio:1kB" >&2
exit 0
"#;

/// Write the fake encoder into `dir` and return its path.
pub fn fake_ffmpeg(dir: &Path) -> PathBuf {
    let path = dir.join("ffmpeg");
    fs::write(&path, FAKE_FFMPEG).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Like [`fake_ffmpeg`], but each encode leaves a background process holding
/// stderr open for a few seconds after the encoder exits.
pub fn lingering_ffmpeg(dir: &Path) -> PathBuf {
    let script = FAKE_FFMPEG.replace(
        "echo \"video:10kB audio:1kB\" >&2\nexit 0",
        "echo \"video:10kB audio:1kB\" >&2\nsleep 5 &\nexit 0",
    );
    assert_ne!(script, FAKE_FFMPEG);
    let path = dir.join("ffmpeg");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Write a config file pointing `tools.ffmpeg_path` at `ffmpeg`.
pub fn write_config(dir: &Path, ffmpeg: &Path, extra: &str) -> PathBuf {
    let path = dir.join("vidforge.toml");
    fs::write(
        &path,
        format!(
            "[tools]\nffmpeg_path = {:?}\n{extra}",
            ffmpeg.to_string_lossy()
        ),
    )
    .unwrap();
    path
}

/// Create an empty file, including parent directories.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, b"").unwrap();
}
