//! Batch runner: sequences prompts through a generator, one job at a time.
//!
//! Idle -> Running -> Idle. A failed job never aborts the run. `stop()` is cooperative:
//! the flag is checked before each job, after each job returns, and around every
//! inter-job delay. A job already submitted keeps running remotely; its result is
//! discarded.

use crate::error::ForgeError;
use crate::job::ModelResult;
use crate::orchestrator::GenerationOrchestrator;
use crate::progress::NoopObserver;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Anything that can turn a prompt into a model. The orchestrator in production, stubs in tests.
#[allow(async_fn_in_trait)]
pub trait PromptGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<ModelResult, ForgeError>;
}

impl PromptGenerator for GenerationOrchestrator {
    async fn generate(&self, prompt: &str) -> Result<ModelResult, ForgeError> {
        GenerationOrchestrator::generate(self, prompt).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchJobStatus {
    Queued,
    Running,
    Done,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchJob {
    pub index: usize,
    pub prompt: String,
    pub status: BatchJobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchJob {
    fn queued(index: usize, prompt: String) -> Self {
        Self {
            index,
            prompt,
            status: BatchJobStatus::Queued,
            error: None,
        }
    }
}

/// Terminal outcome of one batch run. Reported exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BatchOutcome {
    Completed {
        total: usize,
        succeeded: usize,
        failed: usize,
    },
    Stopped {
        index: usize,
        total: usize,
    },
}

impl BatchOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, BatchOutcome::Stopped { .. })
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Completed { total, .. } => write!(f, "completed {}/{}", total, total),
            BatchOutcome::Stopped { index, .. } => write!(f, "stopped at index {}", index),
        }
    }
}

pub trait BatchObserver: Send + Sync {
    fn on_job_update(&self, _job: &BatchJob) {}

    fn on_batch_finished(&self, _outcome: &BatchOutcome) {}
}

/// Runs after a job succeeds when the batch was started with `auto_advance`.
#[async_trait]
pub trait PostSuccessHook: Send + Sync {
    async fn after_success(&self, job: &BatchJob, result: &ModelResult) -> Result<(), ForgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
}

struct BatchState {
    phase: Phase,
    jobs: Vec<BatchJob>,
}

pub struct BatchRunner {
    state: Mutex<BatchState>,
    cancel: AtomicBool,
    wake: Notify,
    observer: Arc<dyn BatchObserver>,
    hook: Option<Arc<dyn PostSuccessHook>>,
}

/// Returns the runner to Idle however `start` exits.
struct RunningGuard<'a> {
    state: &'a Mutex<BatchState>,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().phase = Phase::Idle;
    }
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchRunner {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BatchState {
                phase: Phase::Idle,
                jobs: Vec::new(),
            }),
            cancel: AtomicBool::new(false),
            wake: Notify::new(),
            observer: Arc::new(NoopObserver),
            hook: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_post_success_hook(mut self, hook: Arc<dyn PostSuccessHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().phase == Phase::Running
    }

    /// Snapshot of the current (or last) run's jobs.
    pub fn jobs(&self) -> Vec<BatchJob> {
        self.state.lock().jobs.clone()
    }

    /// Request cancellation of the running batch. No-op when idle.
    pub fn stop(&self) {
        let state = self.state.lock();
        if state.phase != Phase::Running {
            return;
        }
        info!("Batch stop requested");
        self.cancel.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Run `prompts` in order through `generator`.
    ///
    /// Blank prompts are dropped. `delay` is waited between jobs, never after the last one.
    pub async fn start<G: PromptGenerator>(
        &self,
        generator: &G,
        prompts: Vec<String>,
        delay: Duration,
        auto_advance: bool,
    ) -> Result<BatchOutcome, ForgeError> {
        let total = {
            let mut state = self.state.lock();
            if state.phase == Phase::Running {
                return Err(ForgeError::BatchAlreadyRunning);
            }
            let jobs: Vec<BatchJob> = prompts
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .enumerate()
                .map(|(index, prompt)| BatchJob::queued(index, prompt))
                .collect();
            if jobs.is_empty() {
                return Err(ForgeError::EmptyBatch);
            }
            self.cancel.store(false, Ordering::Release);
            state.phase = Phase::Running;
            state.jobs = jobs;
            state.jobs.len()
        };
        let _running = RunningGuard { state: &self.state };
        info!(total, delay_ms = delay.as_millis() as u64, auto_advance, "Batch started");

        let mut succeeded = 0;
        let mut failed = 0;
        let mut stopped_at = None;

        for index in 0..total {
            if self.is_cancelled() {
                stopped_at = Some(index);
                break;
            }

            let job = self.update(index, BatchJobStatus::Running, None);
            let outcome = generator.generate(&job.prompt).await;

            if self.is_cancelled() {
                debug!(index, "Discarding result of job finished after stop");
                self.update(
                    index,
                    BatchJobStatus::Skipped,
                    Some("discarded after stop".to_string()),
                );
                stopped_at = Some(index);
                break;
            }

            match outcome {
                Ok(result) => {
                    succeeded += 1;
                    let job = self.update(index, BatchJobStatus::Done, None);
                    if auto_advance {
                        self.run_hook(&job, &result).await;
                    }
                }
                Err(err) => {
                    failed += 1;
                    warn!(index, prompt = %job.prompt, "Batch job failed: {}", err);
                    self.update(index, BatchJobStatus::Failed, Some(err.to_string()));
                }
            }

            if index + 1 < total && !self.wait_between_jobs(delay).await {
                stopped_at = Some(index + 1);
                break;
            }
        }

        let outcome = match stopped_at {
            Some(index) => {
                self.skip_remaining(index);
                BatchOutcome::Stopped { index, total }
            }
            None => BatchOutcome::Completed {
                total,
                succeeded,
                failed,
            },
        };
        info!(outcome = %outcome, succeeded, failed, "Batch finished");
        self.observer.on_batch_finished(&outcome);
        Ok(outcome)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Inter-job delay. Returns false when the batch was stopped before or during it.
    async fn wait_between_jobs(&self, delay: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        if delay.is_zero() {
            return true;
        }
        let timer = sleep(delay);
        tokio::pin!(timer);
        loop {
            tokio::select! {
                _ = &mut timer => break,
                _ = self.wake.notified() => {
                    if self.is_cancelled() {
                        break;
                    }
                }
            }
        }
        !self.is_cancelled()
    }

    async fn run_hook(&self, job: &BatchJob, result: &ModelResult) {
        let Some(hook) = &self.hook else {
            return;
        };
        if let Err(err) = hook.after_success(job, result).await {
            warn!(index = job.index, prompt = %job.prompt, "Post-success hook failed: {}", err);
        }
    }

    fn update(&self, index: usize, status: BatchJobStatus, error: Option<String>) -> BatchJob {
        let job = {
            let mut state = self.state.lock();
            let job = &mut state.jobs[index];
            job.status = status;
            job.error = error;
            job.clone()
        };
        self.observer.on_job_update(&job);
        job
    }

    fn skip_remaining(&self, from: usize) {
        let skipped: Vec<BatchJob> = {
            let mut state = self.state.lock();
            state
                .jobs
                .iter_mut()
                .skip(from)
                .filter(|job| job.status == BatchJobStatus::Queued)
                .map(|job| {
                    job.status = BatchJobStatus::Skipped;
                    job.clone()
                })
                .collect()
        };
        for job in &skipped {
            self.observer.on_job_update(job);
        }
    }
}

/// Split a prompt list (one per line) into prompts, dropping blank lines.
pub fn parse_prompts(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
