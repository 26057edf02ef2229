//! Job poller: drives one submitted job to a terminal status or timeout.
//!
//! Linear cadence: one `poll` per interval, no backoff and no retry of transport errors.
//! An unreachable provider fails fast instead of burning the wait budget.

use crate::error::ForgeError;
use crate::job::{JobHandle, JobStatus, ModelResult};
use crate::provider::{PollSchedule, ProviderClient};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Drives exactly one job. Owns its handle for the lifetime of the run.
pub struct JobPoller<'a> {
    client: &'a dyn ProviderClient,
    handle: JobHandle,
    schedule: PollSchedule,
}

impl<'a> JobPoller<'a> {
    pub fn new(client: &'a dyn ProviderClient, handle: JobHandle, schedule: PollSchedule) -> Self {
        Self {
            client,
            handle,
            schedule,
        }
    }

    /// Poller using the client's recommended schedule.
    pub fn with_client_schedule(client: &'a dyn ProviderClient, handle: JobHandle) -> Self {
        let schedule = client.poll_schedule();
        Self::new(client, handle, schedule)
    }

    pub fn schedule(&self) -> PollSchedule {
        self.schedule
    }

    /// Poll until the job succeeds, fails, or exceeds `max_wait`.
    ///
    /// `on_progress(elapsed, total)` fires after every non-terminal poll.
    pub async fn run<F>(self, api_key: &str, mut on_progress: F) -> Result<ModelResult, ForgeError>
    where
        F: FnMut(Duration, Duration),
    {
        let provider = self.client.id();
        let PollSchedule { interval, max_wait } = self.schedule;
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            let elapsed = started.elapsed();
            if elapsed >= max_wait {
                info!(
                    provider = %provider,
                    job = %self.handle,
                    polls,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Job poll timed out"
                );
                return Err(ForgeError::GenerationTimeout {
                    provider,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
            }

            let status = self.client.poll(&self.handle, api_key).await?;
            polls += 1;
            let elapsed = started.elapsed();

            match status {
                JobStatus::Succeeded(result) => {
                    info!(
                        provider = %provider,
                        job = %self.handle,
                        polls,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Job succeeded"
                    );
                    return Ok(result);
                }
                JobStatus::Failed(reason) => {
                    info!(provider = %provider, job = %self.handle, polls, reason = %reason, "Job failed");
                    return Err(ForgeError::GenerationFailed {
                        provider,
                        reason,
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
                pending @ (JobStatus::Pending | JobStatus::Running { .. }) => {
                    debug!(
                        provider = %provider,
                        job = %self.handle,
                        polls,
                        status = ?pending,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Job not finished"
                    );
                    on_progress(elapsed, max_wait);
                    // Never sleep past the wait budget.
                    sleep(interval.min(max_wait.saturating_sub(started.elapsed()))).await;
                }
            }
        }
    }
}

/// Percent of the wait budget consumed, clamped to 0-99 so only success reports 100.
pub fn budget_percent(elapsed: Duration, total: Duration) -> u8 {
    if total.is_zero() {
        return 99;
    }
    let pct = elapsed.as_millis().saturating_mul(100) / total.as_millis();
    pct.min(99) as u8
}
