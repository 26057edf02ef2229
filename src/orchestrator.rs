//! Generation orchestrator: validate, select provider, submit, poll, normalize, report.
//!
//! Owns the session's credentials and provider selection. Each `generate` call emits one
//! stream of progress updates and exactly one terminal notification. Only one generation
//! may be outstanding per orchestrator; a concurrent call fails fast with
//! [`ForgeError::AlreadyGenerating`].

use crate::credentials::Credentials;
use crate::error::ForgeError;
use crate::job::{GenerationRequest, ModelResult};
use crate::poller::{budget_percent, JobPoller};
use crate::progress::{
    GenerationFailure, GenerationObserver, GenerationSuccess, NoopObserver, ProgressUpdate,
};
use crate::provider::{ProviderId, ProviderRegistry};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info};

/// Configured/active state of one provider, for selection UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderStatus {
    pub provider: ProviderId,
    pub configured: bool,
    pub active: bool,
}

pub struct GenerationOrchestrator {
    registry: ProviderRegistry,
    credentials: Credentials,
    selected: Option<ProviderId>,
    observer: Arc<dyn GenerationObserver>,
    in_flight: AtomicBool,
}

/// Releases the single-flight slot on drop, including on early return.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ForgeError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ForgeError::AlreadyGenerating)?;
        Ok(Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl GenerationOrchestrator {
    pub fn new(registry: ProviderRegistry, credentials: Credentials) -> Self {
        Self {
            registry,
            credentials,
            selected: None,
            observer: Arc::new(NoopObserver),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_active_provider(mut self, provider: Option<ProviderId>) -> Self {
        self.selected = provider;
        self
    }

    pub fn set_active_provider(&mut self, provider: ProviderId) {
        self.selected = Some(provider);
    }

    pub fn set_credential(&mut self, provider: ProviderId, api_key: impl Into<String>) {
        self.credentials.set(provider, api_key);
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Explicit selection, else the first configured provider, else meshy.
    pub fn active_provider(&self) -> ProviderId {
        self.selected
            .or_else(|| self.credentials.first_configured())
            .unwrap_or(ProviderId::Meshy)
    }

    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.credentials.is_configured(provider)
    }

    pub fn provider_statuses(&self) -> Vec<ProviderStatus> {
        let active = self.active_provider();
        ProviderId::ALL
            .into_iter()
            .map(|provider| ProviderStatus {
                provider,
                configured: self.is_configured(provider),
                active: provider == active,
            })
            .collect()
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Generate a model for `prompt` with the active provider.
    pub async fn generate(&self, prompt: &str) -> Result<ModelResult, ForgeError> {
        self.generate_styled(prompt, None).await
    }

    /// Like [`generate`](Self::generate), appending `style_hints` to the provider prompt.
    pub async fn generate_styled(
        &self,
        prompt: &str,
        style_hints: Option<String>,
    ) -> Result<ModelResult, ForgeError> {
        let started = Instant::now();
        let provider = self.active_provider();
        let outcome = self.run(prompt, provider, style_hints).await;

        match outcome {
            Ok((request, result)) => {
                self.observer.on_success(&GenerationSuccess {
                    request,
                    result: result.clone(),
                    elapsed: started.elapsed(),
                });
                Ok(result)
            }
            Err(err) => {
                let context = if err.is_precondition() {
                    None
                } else {
                    Some(provider)
                };
                self.observer.on_failure(&GenerationFailure::from_error(
                    prompt.trim(),
                    context,
                    &err,
                    started.elapsed(),
                ));
                Err(err)
            }
        }
    }

    fn check_preconditions(&self, prompt: &str, provider: ProviderId) -> Result<(), ForgeError> {
        if prompt.trim().is_empty() {
            return Err(ForgeError::EmptyPrompt);
        }
        if !self.credentials.any_configured() {
            return Err(ForgeError::NoCredentials);
        }
        if !self.credentials.is_configured(provider) {
            return Err(ForgeError::ProviderNotConfigured { provider });
        }
        Ok(())
    }

    async fn run(
        &self,
        prompt: &str,
        provider: ProviderId,
        style_hints: Option<String>,
    ) -> Result<(GenerationRequest, ModelResult), ForgeError> {
        self.check_preconditions(prompt, provider)?;
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let request = GenerationRequest::new(prompt, provider, style_hints)?;
        let client = self.registry.get_or_error(provider)?;
        let api_key = self.credentials.get(provider);
        let schedule = self.registry.schedule_for(provider);

        self.report(provider, format!("Connecting to {}...", provider.display_name()), 0);
        info!(provider = %provider, prompt = %request.prompt(), "Submitting generation job");
        let handle = client.submit(&request, api_key).await?;
        info!(provider = %provider, job = %handle, "Generation job submitted");

        self.report(provider, "Generating model...".to_string(), 0);
        let poller = JobPoller::new(client.as_ref(), handle, schedule);
        let result = poller
            .run(api_key, |elapsed, total| {
                self.report(
                    provider,
                    format!("Generating... ({}s)", elapsed.as_secs()),
                    budget_percent(elapsed, total),
                );
            })
            .await?;

        let result = result.normalized();
        debug!(provider = %provider, format = %result.format(), asset_url = %result.asset_url(), "Model ready");
        self.report(provider, "Downloading model...".to_string(), 100);
        Ok((request, result))
    }

    fn report(&self, provider: ProviderId, message: String, percent: u8) {
        self.observer.on_progress(&ProgressUpdate {
            provider,
            message,
            percent,
        });
    }
}
