use meshforge::provider::{PollSchedule, ProviderId};
use meshforge::{Credentials, ErrorKind, ForgeError, GenerationOrchestrator, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;

use crate::integration::{orchestrator_with, Recorder, StubClient};

fn meshy_key() -> Credentials {
    Credentials::new().with(ProviderId::Meshy, "msy_test")
}

#[tokio::test(start_paused = true)]
async fn test_whitespace_prompt_rejected_without_network() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy));
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator_with(client.clone(), meshy_key(), recorder.clone());

    let err = orchestrator.generate("   \t\n").await.unwrap_err();
    assert!(matches!(err, ForgeError::EmptyPrompt));
    assert_eq!(client.network_calls(), 0);
    assert_eq!(recorder.terminal_count(), 1);
    assert!(recorder.progress.lock().is_empty());
    assert_eq!(recorder.failures.lock()[0].kind, ErrorKind::EmptyPrompt);
}

#[tokio::test(start_paused = true)]
async fn test_missing_credentials_rejected_without_network() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy));
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator_with(client.clone(), Credentials::new(), recorder.clone());

    let err = orchestrator.generate("a wooden chair").await.unwrap_err();
    assert!(matches!(err, ForgeError::NoCredentials));
    assert_eq!(client.network_calls(), 0);

    let failures = recorder.failures.lock();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].provider, None);
    assert_eq!(failures[0].prompt, "a wooden chair");
}

#[tokio::test(start_paused = true)]
async fn test_unconfigured_active_provider_rejected_without_network() {
    let client = Arc::new(StubClient::new(ProviderId::Tripo));
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator_with(client.clone(), meshy_key(), recorder.clone())
        .with_active_provider(Some(ProviderId::Tripo));

    let err = orchestrator.generate("a wooden chair").await.unwrap_err();
    assert!(matches!(
        err,
        ForgeError::ProviderNotConfigured {
            provider: ProviderId::Tripo
        }
    ));
    assert_eq!(client.network_calls(), 0);
    assert_eq!(recorder.terminal_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_successful_generation_reports_progress_in_order() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy).with_pending_polls(2));
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator_with(client.clone(), meshy_key(), recorder.clone());

    let result = orchestrator.generate("  a red dragon  ").await.unwrap();
    assert_eq!(result.asset_url(), "https://cdn.example.com/job-1.glb");
    assert_eq!(client.submits.lock().as_slice(), ["a red dragon"]);
    assert_eq!(client.poll_count(), 3);

    let progress = recorder.progress.lock();
    let messages: Vec<&str> = progress.iter().map(|u| u.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Connecting to MESHY AI...",
            "Generating model...",
            "Generating... (0s)",
            "Generating... (1s)",
            "Downloading model...",
        ]
    );
    assert_eq!(progress.first().unwrap().percent, 0);
    assert_eq!(progress.last().unwrap().percent, 100);
    assert!(progress[..progress.len() - 1].iter().all(|u| u.percent < 100));

    let successes = recorder.successes.lock();
    assert_eq!(successes.len(), 1);
    assert_eq!(successes[0].request.prompt(), "a red dragon");
    // Two pending polls, one interval each, on the paused clock.
    assert_eq!(successes[0].elapsed, Duration::from_secs(2));
    assert!(recorder.failures.lock().is_empty());
    assert!(!orchestrator.is_generating());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_generate_is_rejected() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy).with_pending_polls(3));
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator_with(client.clone(), meshy_key(), recorder.clone());

    let (first, second) = tokio::join!(
        orchestrator.generate("a lamp"),
        orchestrator.generate("a table")
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(ForgeError::AlreadyGenerating)));
    assert_eq!(client.submit_count(), 1);
    assert_eq!(recorder.successes.lock().len(), 1);
    assert_eq!(recorder.failures.lock().len(), 1);
    assert_eq!(recorder.failures.lock()[0].kind, ErrorKind::AlreadyGenerating);

    // The slot is released once the first run finishes.
    orchestrator.generate("a table").await.unwrap();
    assert_eq!(client.submit_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_generation_times_out_after_max_wait() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy).with_pending_polls(u32::MAX));
    let recorder = Arc::new(Recorder::default());
    let mut registry = ProviderRegistry::new();
    registry.register(client.clone());
    registry.set_schedule(ProviderId::Meshy, PollSchedule::from_millis(1_000, 10_000));
    let orchestrator =
        GenerationOrchestrator::new(registry, meshy_key()).with_observer(recorder.clone());

    let err = orchestrator.generate("a spaceship").await.unwrap_err();
    match err {
        ForgeError::GenerationTimeout {
            provider,
            elapsed_ms,
        } => {
            assert_eq!(provider, ProviderId::Meshy);
            assert!(elapsed_ms >= 10_000);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    let polls = client.poll_count();
    assert!((10..=11).contains(&polls), "unexpected poll count {}", polls);

    let failures = recorder.failures.lock();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, ErrorKind::GenerationTimeout);
    assert_eq!(failures[0].provider, Some(ProviderId::Meshy));
    assert_eq!(failures[0].elapsed, Duration::from_secs(10));
    assert!(recorder.progress.lock().iter().all(|u| u.percent <= 99));
}

#[tokio::test(start_paused = true)]
async fn test_provider_failure_is_reported_once() {
    let client = Arc::new(StubClient::new(ProviderId::Meshy).failing_on("a broken mesh"));
    let recorder = Arc::new(Recorder::default());
    let orchestrator = orchestrator_with(client.clone(), meshy_key(), recorder.clone());

    let err = orchestrator.generate("a broken mesh").await.unwrap_err();
    match err {
        ForgeError::GenerationFailed { reason, .. } => assert_eq!(reason, "rejected by provider"),
        other => panic!("expected provider failure, got {:?}", other),
    }
    assert_eq!(recorder.terminal_count(), 1);
    assert!(recorder
        .progress
        .lock()
        .iter()
        .all(|u| u.message != "Downloading model..."));
}

#[tokio::test]
async fn test_csm_reports_not_implemented() {
    let registry = ProviderRegistry::standard().unwrap();
    let recorder = Arc::new(Recorder::default());
    let orchestrator =
        GenerationOrchestrator::new(registry, Credentials::new().with(ProviderId::Csm, "csm_k"))
            .with_active_provider(Some(ProviderId::Csm))
            .with_observer(recorder.clone());

    let err = orchestrator.generate("a teapot").await.unwrap_err();
    assert!(matches!(
        err,
        ForgeError::NotImplemented {
            provider: ProviderId::Csm
        }
    ));
    assert_eq!(recorder.failures.lock().len(), 1);
    assert!(recorder.successes.lock().is_empty());
}
