//! Supervision of one external encode.
//!
//! [`Supervisor::run`] launches the encoder for an [`EncodeJob`], drains its
//! stderr on a background task while awaiting exit, and reconciles the two
//! into a single [`JobOutcome`].
//!
//! ```text
//! NotStarted -> Started -> (Draining || Exited) -> Completed
//! ```
//!
//! The outcome depends only on the exit status. After exit the drain is given
//! [`DEFAULT_DRAIN_GRACE`] to flush its last lines, so the caller's
//! completion message follows the encoder's final output.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use vf_core::{EncodeJob, Error, JobOutcome};

use crate::command::ToolCommand;
use crate::drain::{spawn_drain, DrainReport, DrainSink};

/// How long to wait for the diagnostic stream to close after the encoder exits.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle of a supervised encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    NotStarted,
    Started,
    Draining,
    Exited,
    Completed,
}

/// Result of [`Supervisor::run`].
#[derive(Debug)]
pub struct SupervisedJob<S> {
    pub outcome: JobOutcome,
    /// Drain summary; `None` when the encoder never started or the stream
    /// outlived the drain grace period.
    pub drain: Option<DrainReport<S>>,
}

/// Runs encode jobs against one encoder binary.
#[derive(Debug, Clone)]
pub struct Supervisor {
    ffmpeg: PathBuf,
    drain_grace: Duration,
}

impl Supervisor {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// The full encoder invocation for `job`.
    pub fn command(&self, job: &EncodeJob) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffmpeg.clone());
        cmd.args(encode_args(job));
        cmd
    }

    /// Run `job` to completion, forwarding the encoder's stderr to `sink`.
    ///
    /// Never returns an error: spawn failures, wait failures and non-zero
    /// exits all become a failed [`JobOutcome`].
    pub async fn run<S: DrainSink>(&self, job: &EncodeJob, sink: S) -> SupervisedJob<S> {
        let cmd = self.command(job);
        let tool = cmd.program_name();
        transition(job, JobState::NotStarted);
        tracing::debug!("exec: {}", cmd.display_line());

        let mut child = match cmd.spawn_stderr_piped() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("Failed to start encoder for {}: {e}", job.source().display());
                return SupervisedJob {
                    outcome: JobOutcome::failed(job, e),
                    drain: None,
                };
            }
        };
        transition(job, JobState::Started);

        let drain = child.stderr.take().map(|stderr| spawn_drain(stderr, sink));
        transition(job, JobState::Draining);

        let status = child.wait().await;
        transition(job, JobState::Exited);

        let report = match drain {
            Some(handle) => match handle.join_within(self.drain_grace).await {
                Ok(Some(report)) => Some(report),
                Ok(None) => {
                    tracing::warn!(
                        "Diagnostic stream for {} still open {:?} after exit; abandoning drain",
                        job.source().display(),
                        self.drain_grace
                    );
                    None
                }
                Err(e) => {
                    tracing::warn!("{e}");
                    None
                }
            },
            None => None,
        };
        transition(job, JobState::Completed);

        let outcome = match status {
            Ok(status) if status.success() => JobOutcome::succeeded(job),
            Ok(status) => {
                let message = match report.as_ref().and_then(|r| r.last_line.as_deref()) {
                    Some(last) => format!("{status}: {last}"),
                    None => status.to_string(),
                };
                JobOutcome::failed(job, Error::tool(tool, message))
            }
            Err(e) => JobOutcome::failed(
                job,
                Error::tool(tool, format!("I/O error waiting for process: {e}")),
            ),
        };

        SupervisedJob {
            outcome,
            drain: report,
        }
    }
}

fn transition(job: &EncodeJob, state: JobState) {
    tracing::debug!(source = %job.source().display(), state = ?state, "encode state");
}

/// Encoder argument vector for `job`, in invocation order.
///
/// Paths are passed as OS strings, so file names that are not valid UTF-8
/// reach the encoder byte for byte.
pub fn encode_args(job: &EncodeJob) -> Vec<OsString> {
    let params = job.params();
    let mut args: Vec<OsString> = vec![
        "-i".into(),
        job.source().into(),
        "-c:v".into(),
        params.codec.as_str().into(),
        "-preset".into(),
        params.preset.as_str().into(),
        "-threads".into(),
        params.threads.to_string().into(),
        "-crf".into(),
        params.crf.to_string().into(),
        "-c:a".into(),
        "copy".into(),
        "-y".into(),
    ];
    if let Some(subtitle) = job.subtitle() {
        args.push("-vf".into());
        args.push(subtitle_filter(subtitle));
    }
    args.push(job.output().into());
    args
}

/// `subtitles=<path>` filter with the path escaped for both the filter-option
/// and filtergraph levels.
pub fn subtitle_filter(subtitle: &Path) -> OsString {
    let option_level = escape_bytes(subtitle.as_os_str(), b"\\':");
    let graph_level = escape_bytes(&option_level, b"\\'[],;");
    let mut filter = OsString::from("subtitles=");
    filter.push(graph_level);
    filter
}

/// Backslash-escape every ASCII byte of `s` found in `special`.
#[cfg(unix)]
fn escape_bytes(s: &OsStr, special: &[u8]) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if special.contains(&b) {
            out.push(b'\\');
        }
        out.push(b);
    }
    OsString::from_vec(out)
}

#[cfg(not(unix))]
fn escape_bytes(s: &OsStr, special: &[u8]) -> OsString {
    let lossy = s.to_string_lossy();
    let mut out = String::with_capacity(lossy.len());
    for c in lossy.chars() {
        if c.is_ascii() && special.contains(&(c as u8)) {
            out.push('\\');
        }
        out.push(c);
    }
    out.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vf_core::EncodeParams;

    #[derive(Debug, Default)]
    struct Recorder {
        lines: Vec<String>,
        progress: Vec<f64>,
    }

    impl DrainSink for Recorder {
        fn line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }

        fn progress(&mut self, percent: f64) {
            self.progress.push(percent);
        }
    }

    fn job(subtitle: Option<&str>) -> EncodeJob {
        EncodeJob::new(
            "/media/in/movie.mkv",
            EncodeParams::default(),
            subtitle.map(PathBuf::from),
        )
    }

    #[test]
    fn args_without_subtitle() {
        assert_eq!(
            encode_args(&job(None)),
            vec![
                "-i", "/media/in/movie.mkv", "-c:v", "hevc", "-preset", "medium", "-threads",
                "0", "-crf", "28", "-c:a", "copy", "-y", "/media/in/movie_hevc.mp4",
            ]
        );
    }

    #[test]
    fn args_with_subtitle_insert_filter_before_output() {
        let args = encode_args(&job(Some("/media/in/movie.srt")));
        let n = args.len();
        assert_eq!(args[n - 3], "-vf");
        assert_eq!(args[n - 2], "subtitles=/media/in/movie.srt");
        assert_eq!(args[n - 1], "/media/in/movie_hevc.mp4");
    }

    #[test]
    fn args_follow_params() {
        let params = EncodeParams {
            codec: "h264".into(),
            preset: "slow".into(),
            crf: 18,
            threads: 8,
        };
        let args = encode_args(&EncodeJob::new("a.mp4", params, None));
        assert_eq!(
            args,
            vec![
                "-i", "a.mp4", "-c:v", "h264", "-preset", "slow", "-threads", "8", "-crf", "18",
                "-c:a", "copy", "-y", "a_h264.mp4",
            ]
        );
    }

    #[test]
    fn subtitle_filter_escapes_special_characters() {
        assert_eq!(subtitle_filter(Path::new("/subs/a.srt")), "subtitles=/subs/a.srt");
        assert_eq!(
            subtitle_filter(Path::new("/subs/Part 1: Intro.srt")),
            "subtitles=/subs/Part 1\\\\: Intro.srt"
        );
        assert_eq!(
            subtitle_filter(Path::new("/subs/a,b[1].srt")),
            "subtitles=/subs/a\\,b\\[1\\].srt"
        );
        assert_eq!(
            subtitle_filter(Path::new("/subs/it's.srt")),
            "subtitles=/subs/it\\\\\\'s.srt"
        );
    }

    #[cfg(unix)]
    #[test]
    fn subtitle_filter_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let filter = subtitle_filter(Path::new(OsStr::from_bytes(b"/subs/caf\xe9: 1.srt")));
        assert_eq!(filter.as_bytes(), b"subtitles=/subs/caf\xe9\\\\: 1.srt");
    }

    #[test]
    fn command_uses_configured_binary() {
        let cmd = Supervisor::new("/opt/ffmpeg/bin/ffmpeg").command(&job(None));
        assert_eq!(cmd.program(), Path::new("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(cmd.get_args()[0], "-i");
    }

    #[tokio::test]
    async fn missing_binary_fails_without_drain() {
        let supervisor = Supervisor::new("/nonexistent/ffmpeg_xyz");
        let run = supervisor.run(&job(None), Recorder::default()).await;
        assert!(!run.outcome.success());
        assert!(run.drain.is_none());
        let err = run.outcome.error.unwrap().to_string();
        assert!(err.contains("failed to spawn"), "unexpected error: {err}");
    }

    #[cfg(unix)]
    mod fake_encoder {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[tokio::test]
        async fn successful_encode_forwards_all_lines() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = fake_ffmpeg(
                dir.path(),
                r#"echo "Input #0, matroska" >&2
echo "frame=100 fps=10 time=00:01:30.50 duration=600.0" >&2
echo "frame=200 fps=10 time=00:05:00.00 duration=600.0" >&2
echo "video:1024kB audio:64kB" >&2
exit 0"#,
            );

            let run = Supervisor::new(ffmpeg).run(&job(None), Recorder::default()).await;

            assert!(run.outcome.success(), "{:?}", run.outcome.error);
            assert_eq!(run.outcome.output, PathBuf::from("/media/in/movie_hevc.mp4"));
            let report = run.drain.unwrap();
            assert_eq!(report.lines, 4);
            assert_eq!(report.sink.lines[0], "Input #0, matroska");
            assert_eq!(report.sink.lines[3], "video:1024kB audio:64kB");
            assert_eq!(report.sink.progress.len(), 2);
            assert!((report.sink.progress[0] - 15.083333333).abs() < 1e-6);
            assert!((report.sink.progress[1] - 50.0).abs() < 1e-9);
        }

        #[tokio::test]
        async fn nonzero_exit_fails_with_last_line() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = fake_ffmpeg(
                dir.path(),
                r#"echo "Unknown encoder 'hevc_magic'" >&2
exit 3"#,
            );

            let run = Supervisor::new(ffmpeg).run(&job(None), Recorder::default()).await;

            assert!(!run.outcome.success());
            let err = run.outcome.error.unwrap();
            assert!(matches!(err, Error::Tool { ref tool, .. } if tool == "ffmpeg"));
            let msg = err.to_string();
            assert!(msg.contains("exit status: 3"), "unexpected error: {msg}");
            assert!(!msg.contains("status exit status"), "unexpected error: {msg}");
            assert!(msg.contains("Unknown encoder 'hevc_magic'"), "unexpected error: {msg}");
        }

        #[tokio::test]
        async fn receives_encode_arguments() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = fake_ffmpeg(dir.path(), r#"printf '%s\n' "$*" >&2"#);

            let run = Supervisor::new(ffmpeg)
                .run(&job(Some("/media/in/movie.srt")), Recorder::default())
                .await;

            assert!(run.outcome.success());
            let report = run.drain.unwrap();
            assert_eq!(
                report.sink.lines,
                vec![
                    "-i /media/in/movie.mkv -c:v hevc -preset medium -threads 0 -crf 28 \
                     -c:a copy -y -vf subtitles=/media/in/movie.srt /media/in/movie_hevc.mp4"
                ]
            );
        }

        #[tokio::test]
        async fn non_utf8_source_reaches_encoder_unchanged() {
            use std::os::unix::ffi::OsStrExt;

            let dir = tempfile::tempdir().unwrap();
            let source = dir.path().join(OsStr::from_bytes(b"caf\xe9.mkv"));
            std::fs::write(&source, b"").unwrap();
            let ffmpeg = fake_ffmpeg(
                dir.path(),
                r#"[ -e "$2" ] || { echo "$2: No such file or directory" >&2; exit 1; }
for last; do :; done
: > "$last""#,
            );

            let job = EncodeJob::new(&source, EncodeParams::default(), None);
            let run = Supervisor::new(ffmpeg).run(&job, Recorder::default()).await;

            assert!(run.outcome.success(), "{:?}", run.outcome.error);
            let expected = dir.path().join(OsStr::from_bytes(b"caf\xe9_hevc.mp4"));
            assert_eq!(run.outcome.output, expected);
            assert!(expected.exists());
        }

        #[tokio::test]
        async fn output_larger_than_pipe_buffer_does_not_stall() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = fake_ffmpeg(
                dir.path(),
                r#"i=0
while [ $i -lt 5000 ]; do
  echo "frame=$i fps=25 q=28.0 size=1024kB time=00:00:01.00 duration=10.0 bitrate=100kbits/s" >&2
  i=$((i+1))
done"#,
            );

            let run = tokio::time::timeout(
                Duration::from_secs(60),
                Supervisor::new(ffmpeg).run(&job(None), Recorder::default()),
            )
            .await
            .expect("encode stalled");

            assert!(run.outcome.success());
            let report = run.drain.unwrap();
            assert_eq!(report.lines, 5000);
            assert_eq!(report.progress_updates, 5000);
        }

        #[tokio::test]
        async fn lingering_stream_is_abandoned_after_grace() {
            let dir = tempfile::tempdir().unwrap();
            // The background sleep inherits stderr and keeps it open after
            // the encoder itself exits.
            let ffmpeg = fake_ffmpeg(
                dir.path(),
                r#"echo "started" >&2
sleep 5 &
exit 0"#,
            );

            let run = Supervisor::new(ffmpeg)
                .drain_grace(Duration::from_millis(200))
                .run(&job(None), Recorder::default())
                .await;

            assert!(run.outcome.success());
            assert!(run.drain.is_none());
        }
    }
}
