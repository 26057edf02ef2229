//! Sinks for generation progress and terminal outcomes.

use crate::batch::{BatchJob, BatchObserver, BatchOutcome};
use crate::error::{ErrorKind, ForgeError};
use crate::job::{GenerationRequest, ModelResult};
use crate::progress::event::{ProgressEnvelope, ProgressEvent};
use crate::provider::ProviderId;
use futures::channel::mpsc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// One status update during a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub provider: ProviderId,
    pub message: String,
    /// 0-100
    pub percent: u8,
}

#[derive(Debug, Clone)]
pub struct GenerationSuccess {
    pub request: GenerationRequest,
    pub result: ModelResult,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct GenerationFailure {
    pub prompt: String,
    pub provider: Option<ProviderId>,
    pub kind: ErrorKind,
    pub message: String,
    pub elapsed: Duration,
}

impl GenerationFailure {
    pub fn from_error(
        prompt: &str,
        provider: Option<ProviderId>,
        error: &ForgeError,
        elapsed: Duration,
    ) -> Self {
        Self {
            prompt: prompt.to_string(),
            provider: error.provider().or(provider),
            kind: error.kind(),
            message: error.to_string(),
            elapsed,
        }
    }
}

/// Progress, result and failure sinks for one orchestrator.
///
/// For every `generate` call exactly one of `on_success` / `on_failure` fires.
pub trait GenerationObserver: Send + Sync {
    fn on_progress(&self, _update: &ProgressUpdate) {}

    fn on_success(&self, _success: &GenerationSuccess) {}

    fn on_failure(&self, _failure: &GenerationFailure) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl GenerationObserver for NoopObserver {}

impl BatchObserver for NoopObserver {}

/// Logs every notification through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl GenerationObserver for TracingObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        tracing::debug!(
            provider = %update.provider,
            percent = update.percent,
            "{}",
            update.message
        );
    }

    fn on_success(&self, success: &GenerationSuccess) {
        info!(
            provider = %success.request.provider(),
            prompt = %success.request.prompt(),
            asset_url = %success.result.asset_url(),
            elapsed_ms = success.elapsed.as_millis() as u64,
            "Model generated"
        );
    }

    fn on_failure(&self, failure: &GenerationFailure) {
        warn!(
            provider = ?failure.provider,
            prompt = %failure.prompt,
            kind = ?failure.kind,
            elapsed_ms = failure.elapsed.as_millis() as u64,
            "Generation failed: {}",
            failure.message
        );
    }
}

impl BatchObserver for TracingObserver {
    fn on_job_update(&self, job: &BatchJob) {
        tracing::debug!(index = job.index, status = ?job.status, prompt = %job.prompt, "Batch job updated");
    }

    fn on_batch_finished(&self, outcome: &BatchOutcome) {
        info!(outcome = %outcome, "Batch finished");
    }
}

/// Forwards to several observers in registration order.
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn GenerationObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn push(&mut self, observer: Arc<dyn GenerationObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl GenerationObserver for ObserverSet {
    fn on_progress(&self, update: &ProgressUpdate) {
        for observer in &self.observers {
            observer.on_progress(update);
        }
    }

    fn on_success(&self, success: &GenerationSuccess) {
        for observer in &self.observers {
            observer.on_success(success);
        }
    }

    fn on_failure(&self, failure: &GenerationFailure) {
        for observer in &self.observers {
            observer.on_failure(failure);
        }
    }
}

/// Observer that publishes every notification onto an unbounded event stream.
#[derive(Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ProgressEnvelope>,
    seq: Arc<AtomicU64>,
}

/// Create a channel observer and the receiving end of its event stream.
pub fn event_channel() -> (ChannelObserver, mpsc::UnboundedReceiver<ProgressEnvelope>) {
    let (sender, receiver) = mpsc::unbounded();
    (
        ChannelObserver {
            sender,
            seq: Arc::new(AtomicU64::new(1)),
        },
        receiver,
    )
}

impl ChannelObserver {
    fn emit(&self, event: ProgressEvent) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        // A dropped receiver only means nobody is listening anymore.
        let _ = self
            .sender
            .unbounded_send(ProgressEnvelope::with_now(seq, event));
    }
}

impl GenerationObserver for ChannelObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.emit(ProgressEvent::Status {
            provider: update.provider,
            message: update.message.clone(),
            percent: update.percent,
        });
    }

    fn on_success(&self, success: &GenerationSuccess) {
        self.emit(ProgressEvent::Succeeded {
            provider: success.request.provider(),
            prompt: success.request.prompt().to_string(),
            result: success.result.clone(),
            elapsed_ms: success.elapsed.as_millis() as u64,
        });
    }

    fn on_failure(&self, failure: &GenerationFailure) {
        self.emit(ProgressEvent::Failed {
            provider: failure.provider,
            prompt: failure.prompt.clone(),
            kind: failure.kind,
            message: failure.message.clone(),
            elapsed_ms: failure.elapsed.as_millis() as u64,
        });
    }
}

impl BatchObserver for ChannelObserver {
    fn on_job_update(&self, job: &BatchJob) {
        self.emit(ProgressEvent::BatchJobUpdated { job: job.clone() });
    }

    fn on_batch_finished(&self, outcome: &BatchOutcome) {
        self.emit(ProgressEvent::BatchFinished {
            outcome: outcome.clone(),
        });
    }
}
