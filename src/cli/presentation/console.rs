//! Live progress on stderr while a command runs.

use crate::batch::{BatchJob, BatchJobStatus, BatchObserver, BatchOutcome};
use crate::progress::{GenerationFailure, GenerationObserver, GenerationSuccess, ProgressUpdate};
use owo_colors::OwoColorize;

/// Writes generation and batch notifications to stderr, keeping stdout for results.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl GenerationObserver for ConsoleObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        eprintln!(
            "{} {:>3}% {}",
            update.provider.display_name().cyan(),
            update.percent,
            update.message
        );
    }

    fn on_success(&self, success: &GenerationSuccess) {
        eprintln!(
            "{} Model generated in {}s",
            "✓".green(),
            success.elapsed.as_secs()
        );
    }

    fn on_failure(&self, failure: &GenerationFailure) {
        eprintln!("{} {}", "✗".red(), failure.message);
    }
}

impl BatchObserver for ConsoleObserver {
    fn on_job_update(&self, job: &BatchJob) {
        let label = match job.status {
            BatchJobStatus::Queued => return,
            BatchJobStatus::Running => format!("{}", "running".yellow()),
            BatchJobStatus::Done => format!("{}", "done".green()),
            BatchJobStatus::Failed => format!("{}", "failed".red()),
            BatchJobStatus::Skipped => format!("{}", "skipped".dimmed()),
        };
        eprintln!("[{}] {} {}", job.index + 1, label, job.prompt);
    }

    fn on_batch_finished(&self, outcome: &BatchOutcome) {
        eprintln!("{} Batch {}", "■".bold(), outcome);
    }
}
