//! Property-based tests for prompt handling

use meshforge::poller::budget_percent;
use meshforge::provider::ProviderId;
use meshforge::{
    Credentials, ForgeError, GenerationOrchestrator, GenerationRequest, ModelFormat, ModelResult,
    ProviderRegistry,
};
use proptest::prelude::*;
use std::time::Duration;

/// Whitespace-only prompts never reach a provider
#[test]
fn test_blank_prompt_rejected_property() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    // An empty registry: any attempt to reach a client would surface as a different error.
    let orchestrator = GenerationOrchestrator::new(
        ProviderRegistry::new(),
        Credentials::new().with(ProviderId::Meshy, "msy_test"),
    );
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[ \t\r\n]{0,24}", |prompt| {
            let result = runtime.block_on(orchestrator.generate(&prompt));
            prop_assert!(matches!(result, Err(ForgeError::EmptyPrompt)));
            prop_assert!(!orchestrator.is_generating());
            Ok(())
        })
        .unwrap();
}

/// Requests store the trimmed prompt and keep it non-empty
#[test]
fn test_request_prompt_trimmed_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[ \t]{0,4}", "[a-z][a-z ]{0,30}[a-z]", "[ \t\n]{0,4}"),
            |(lead, body, tail)| {
                let raw = format!("{}{}{}", lead, body, tail);
                let request = GenerationRequest::new(&raw, ProviderId::Tripo, None).unwrap();
                prop_assert_eq!(request.prompt(), body.as_str());
                prop_assert_eq!(request.provider_prompt(), body.clone());
                prop_assert_eq!(request.provider(), ProviderId::Tripo);
                Ok(())
            },
        )
        .unwrap();
}

/// The URL extension decides the format when the provider names none
#[test]
fn test_model_format_from_extension_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-z0-9]{1,12}", prop_oneof![Just("glb"), Just("obj"), Just("GLB")]),
            |(stem, ext)| {
                let url = format!("https://assets.example.com/models/{}.{}", stem, ext);
                let result = ModelResult::new(ProviderId::Meshy, &url, None, None).unwrap();
                let expected = if ext.eq_ignore_ascii_case("obj") {
                    ModelFormat::Obj
                } else {
                    ModelFormat::Glb
                };
                prop_assert_eq!(result.format(), expected);
                prop_assert!(result.asset_url().starts_with("https://"));
                Ok(())
            },
        )
        .unwrap();
}

/// Non-http asset locations are never accepted
#[test]
fn test_relative_asset_url_rejected_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[a-z0-9/]{1,20}\\.glb", |path| {
            prop_assert!(ModelResult::new(ProviderId::Meshy, &path, None, None).is_err());
            Ok(())
        })
        .unwrap();
}

/// Polling progress stays below 100 whatever the elapsed time
#[test]
fn test_budget_percent_bounded_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(0u64..10_000_000, 0u64..10_000_000),
            |(elapsed_ms, total_ms)| {
                let pct = budget_percent(
                    Duration::from_millis(elapsed_ms),
                    Duration::from_millis(total_ms),
                );
                prop_assert!(pct <= 99);
                if total_ms > 0 && elapsed_ms < total_ms {
                    prop_assert_eq!(pct as u64, (elapsed_ms * 100 / total_ms).min(99));
                }
                Ok(())
            },
        )
        .unwrap();
}
