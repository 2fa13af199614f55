//! Batch driver.
//!
//! Walks a folder for video files, builds one [`EncodeJob`] per file, checks the
//! encoder once, and runs the jobs one after another through a [`Supervisor`].
//! Whether a failed job stops the batch is decided by [`FailurePolicy`].

use std::path::{Path, PathBuf};

use vf_av::{check_encoder, DrainSink, EncoderMatch, Supervisor};
use vf_core::config::Config;
use vf_core::media::{find_subtitle, is_video_file};
use vf_core::{EncodeJob, EncodeParams, Error, JobOutcome};

/// What to do after a job fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and move on to the next file.
    #[default]
    Continue,
    /// Stop the batch at the first failure.
    Abort,
}

impl FailurePolicy {
    pub fn from_fail_fast(fail_fast: bool) -> Self {
        if fail_fast {
            Self::Abort
        } else {
            Self::Continue
        }
    }
}

/// Settings for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub folder: PathBuf,
    pub params: EncodeParams,
    pub subtitles: bool,
    pub policy: FailurePolicy,
    pub encoder_match: EncoderMatch,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            folder: config.encode.folder.clone(),
            params: config.encode.params(),
            subtitles: config.encode.subtitles,
            policy: FailurePolicy::from_fail_fast(config.batch.fail_fast),
            encoder_match: EncoderMatch::from_strict(config.batch.strict_encoder_match),
        }
    }
}

/// Receives per-job lifecycle callbacks from [`BatchDriver::run`].
pub trait BatchObserver {
    type Sink: DrainSink;

    /// Called before job `index` (0-based) of `total` starts; returns the sink
    /// that will receive the encoder's diagnostic output.
    fn job_started(&mut self, index: usize, total: usize, job: &EncodeJob) -> Self::Sink;

    /// Called once the job's outcome is known.
    fn job_finished(&mut self, outcome: &JobOutcome);
}

/// Aggregate result of a batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of video files found.
    pub candidates: usize,
    pub succeeded: Vec<JobOutcome>,
    pub failed: Vec<JobOutcome>,
    /// Whether the batch stopped early under [`FailurePolicy::Abort`].
    pub aborted: bool,
}

impl BatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Files that were never attempted.
    pub fn skipped(&self) -> usize {
        self.candidates - self.succeeded.len() - self.failed.len()
    }
}

/// Runs a whole batch against one encoder binary.
#[derive(Debug, Clone)]
pub struct BatchDriver {
    ffmpeg: PathBuf,
    supervisor: Supervisor,
    options: BatchOptions,
}

impl BatchDriver {
    pub fn new(ffmpeg: impl Into<PathBuf>, options: BatchOptions) -> Self {
        let ffmpeg = ffmpeg.into();
        Self {
            supervisor: Supervisor::new(ffmpeg.clone()),
            ffmpeg,
            options,
        }
    }

    /// Replace the default supervisor, e.g. to change the drain grace period.
    pub fn with_supervisor(mut self, supervisor: Supervisor) -> Self {
        self.supervisor = supervisor;
        self
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Confirm the configured codec is offered by the encoder.
    pub async fn check_encoder(&self) -> vf_core::Result<()> {
        self.options.params.validate()?;
        check_encoder(&self.ffmpeg, &self.options.params.codec, self.options.encoder_match).await
    }

    /// Build the job list without running anything.
    pub fn plan(&self) -> vf_core::Result<Vec<EncodeJob>> {
        self.options.params.validate()?;
        collect_jobs(&self.options.folder, &self.options.params, self.options.subtitles)
    }

    /// Check the encoder, collect jobs, and run them sequentially.
    ///
    /// # Errors
    ///
    /// Only setup and traversal failures are returned as errors; per-job
    /// failures are recorded in the [`BatchReport`].
    pub async fn run<O: BatchObserver>(&self, observer: &mut O) -> vf_core::Result<BatchReport> {
        self.check_encoder().await?;

        let jobs = self.plan()?;
        let total = jobs.len();
        tracing::info!(
            "Found {total} video files under {}",
            self.options.folder.display()
        );

        let mut report = BatchReport {
            candidates: total,
            ..BatchReport::default()
        };

        for (index, job) in jobs.iter().enumerate() {
            tracing::info!("[{}/{}] Encoding {job}", index + 1, total);
            let sink = observer.job_started(index, total, job);
            let run = self.supervisor.run(job, sink).await;
            observer.job_finished(&run.outcome);

            if run.outcome.success() {
                report.succeeded.push(run.outcome);
                continue;
            }

            if let Some(ref e) = run.outcome.error {
                tracing::warn!("Encoding {} failed: {e}", job.source().display());
            }
            report.failed.push(run.outcome);

            if self.options.policy == FailurePolicy::Abort {
                report.aborted = true;
                tracing::warn!("Stopping batch after first failure");
                break;
            }
        }

        Ok(report)
    }
}

/// Walk `folder` and build one job per video file, in file-name order.
///
/// The walk completes before any job exists, so outputs written later are
/// never picked up. Symbolic links are not followed.
///
/// # Errors
///
/// Returns [`Error::Traversal`] on the first unreadable entry.
pub fn collect_jobs(
    folder: &Path,
    params: &EncodeParams,
    subtitles: bool,
) -> vf_core::Result<Vec<EncodeJob>> {
    let mut jobs = Vec::new();

    for entry in walkdir::WalkDir::new(folder).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(folder).to_path_buf();
            Error::traversal(path, e.to_string())
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if !is_video_file(path) {
            continue;
        }

        let subtitle = if subtitles { find_subtitle(path) } else { None };
        if let Some(ref s) = subtitle {
            tracing::debug!("Using subtitle {} for {}", s.display(), path.display());
        }

        jobs.push(EncodeJob::new(path, params.clone(), subtitle));
    }

    Ok(jobs)
}
