//! Terminal reporting for batch runs, rendered via `indicatif` progress bars.
//!
//! Each job gets one bar on stdout. Encoder diagnostic lines are printed above
//! the bar and progress updates move the bar in place. When stdout is not a
//! terminal the bar is hidden and lines are printed plainly.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use vf_av::DrainSink;
use vf_core::{EncodeJob, JobOutcome};

use crate::batch::{BatchObserver, BatchReport};

/// [`DrainSink`] that writes to a job's progress bar.
pub struct ConsoleSink {
    bar: ProgressBar,
    show_lines: bool,
}

impl DrainSink for ConsoleSink {
    fn line(&mut self, line: &str) {
        if !self.show_lines {
            return;
        }
        if self.bar.is_hidden() {
            println!("{line}");
        } else {
            self.bar.println(line);
        }
    }

    fn progress(&mut self, percent: f64) {
        self.bar.set_position(percent.round() as u64);
        self.bar.set_message(format!("{percent:.2}%"));
    }
}

/// [`BatchObserver`] printing per-job progress and results.
pub struct ConsoleObserver {
    show_lines: bool,
    current: Option<ProgressBar>,
}

impl ConsoleObserver {
    /// `quiet` suppresses the encoder's diagnostic lines; progress and
    /// results are still shown.
    pub fn new(quiet: bool) -> Self {
        Self {
            show_lines: !quiet,
            current: None,
        }
    }

    fn new_bar(index: usize, total: usize) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░");

        let bar = ProgressBar::with_draw_target(Some(100), ProgressDrawTarget::stdout());
        bar.set_style(style);
        bar.set_prefix(format!("[{}/{}]", index + 1, total));
        bar.set_message("0.00%");
        bar
    }
}

impl BatchObserver for ConsoleObserver {
    type Sink = ConsoleSink;

    fn job_started(&mut self, index: usize, total: usize, job: &EncodeJob) -> ConsoleSink {
        println!(
            "{} {}",
            style(format!("[{}/{}]", index + 1, total)).bold(),
            job
        );
        let bar = Self::new_bar(index, total);
        self.current = Some(bar.clone());
        ConsoleSink {
            bar,
            show_lines: self.show_lines,
        }
    }

    fn job_finished(&mut self, outcome: &JobOutcome) {
        if let Some(bar) = self.current.take() {
            bar.finish_and_clear();
        }
        match outcome.error {
            None => println!(
                "{} Converted: {} -> {}",
                style("✓").green(),
                outcome.source.display(),
                outcome.output.display()
            ),
            Some(ref e) => println!(
                "{} Failed: {}: {}",
                style("✗").red(),
                outcome.source.display(),
                e
            ),
        }
    }
}

/// Print the end-of-batch summary.
pub fn print_summary(report: &BatchReport) {
    println!();
    if report.candidates == 0 {
        println!("No video files found.");
        return;
    }

    println!(
        "{} converted, {} failed, {} skipped ({} files found)",
        report.succeeded.len(),
        report.failed.len(),
        report.skipped(),
        report.candidates
    );
    for outcome in &report.failed {
        println!("  {} {}", style("✗").red(), outcome.source.display());
    }
    if report.aborted {
        println!("Batch stopped after the first failure (--fail-fast).");
    }
}
