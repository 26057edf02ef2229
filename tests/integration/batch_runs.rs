use meshforge::batch::BatchObserver;
use meshforge::progress::{event_channel, ProgressEvent};
use meshforge::provider::ProviderId;
use meshforge::{BatchJob, BatchJobStatus, BatchOutcome, BatchRunner, Credentials};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use crate::integration::{orchestrator_with, Recorder, StubClient};

fn prompts(items: &[&str]) -> Vec<String> {
    items.iter().map(|p| p.to_string()).collect()
}

fn meshy_key() -> Credentials {
    Credentials::new().with(ProviderId::Meshy, "msy_test")
}

/// Stops its runner as soon as the job at `index` starts.
struct StopAt {
    index: usize,
    runner: OnceLock<Weak<BatchRunner>>,
}

impl BatchObserver for StopAt {
    fn on_job_update(&self, job: &BatchJob) {
        if job.index == self.index && job.status == BatchJobStatus::Running {
            if let Some(runner) = self.runner.get().and_then(Weak::upgrade) {
                runner.stop();
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_batch_continues_past_failed_job() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy).failing_on("b"));
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator_with(client.clone(), meshy_key(), recorder.clone());
    let runner = BatchRunner::new();

    let outcome = runner
        .start(
            &orchestrator,
            prompts(&["a", "b", "c"]),
            Duration::from_secs(3),
            false,
        )
        .await
        .unwrap();

    assert_eq!(outcome.to_string(), "completed 3/3");
    assert_eq!(
        outcome,
        BatchOutcome::Completed {
            total: 3,
            succeeded: 2,
            failed: 1
        }
    );
    assert_eq!(client.submit_count(), 3);

    let statuses: Vec<_> = runner.jobs().iter().map(|j| j.status).collect();
    assert_eq!(
        statuses,
        vec![
            BatchJobStatus::Done,
            BatchJobStatus::Failed,
            BatchJobStatus::Done
        ]
    );
    assert_eq!(recorder.successes.lock().len(), 2);
    assert_eq!(recorder.failures.lock().len(), 1);
    assert!(!runner.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_job_discards_result_and_skips_rest() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy));
    let orchestrator = orchestrator_with(client.clone(), meshy_key(), Arc::new(Recorder::default()));
    let stopper = Arc::new(StopAt {
        index: 1,
        runner: OnceLock::new(),
    });
    let runner = Arc::new(BatchRunner::new().with_observer(stopper.clone()));
    stopper.runner.set(Arc::downgrade(&runner)).unwrap();

    let outcome = runner
        .start(
            &orchestrator,
            prompts(&["p0", "p1", "p2"]),
            Duration::from_millis(500),
            false,
        )
        .await
        .unwrap();

    assert_eq!(outcome.to_string(), "stopped at index 1");
    assert!(outcome.is_stopped());
    // Job 1 was already submitted when the stop landed.
    assert_eq!(client.submit_count(), 2);

    let jobs = runner.jobs();
    assert_eq!(jobs[0].status, BatchJobStatus::Done);
    assert!(jobs[1..]
        .iter()
        .all(|j| j.status == BatchJobStatus::Skipped));
    assert!(!runner.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_batch_events_end_with_single_finish() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy));
    let orchestrator = orchestrator_with(client, meshy_key(), Arc::new(Recorder::default()));
    let (observer, mut events) = event_channel();
    let runner = BatchRunner::new().with_observer(Arc::new(observer));

    runner
        .start(
            &orchestrator,
            prompts(&["first", "", "second"]),
            Duration::from_secs(1),
            false,
        )
        .await
        .unwrap();

    let mut collected = Vec::new();
    while let Ok(Some(envelope)) = events.try_next() {
        collected.push(envelope);
    }

    let finished: Vec<_> = collected
        .iter()
        .filter(|e| matches!(e.event, ProgressEvent::BatchFinished { .. }))
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(matches!(
        collected.last().unwrap().event,
        ProgressEvent::BatchFinished {
            outcome: BatchOutcome::Completed { total: 2, .. }
        }
    ));

    // Running then Done for each non-blank prompt.
    let updates = collected
        .iter()
        .filter(|e| matches!(e.event, ProgressEvent::BatchJobUpdated { .. }))
        .count();
    assert_eq!(updates, 4);
}

#[tokio::test]
async fn test_second_start_while_running_is_rejected() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy).with_pending_polls(0));
    let orchestrator = orchestrator_with(client, meshy_key(), Arc::new(Recorder::default()));
    let runner = BatchRunner::new();

    let (first, second) = tokio::join!(
        runner.start(&orchestrator, prompts(&["x", "y"]), Duration::from_millis(20), false),
        runner.start(&orchestrator, prompts(&["z"]), Duration::ZERO, false)
    );

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(meshforge::ForgeError::BatchAlreadyRunning)
    ));
}
