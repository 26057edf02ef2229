//! Shared test utilities for integration tests
//!
//! Scripted provider clients, recording observers, and XDG environment isolation.

use async_trait::async_trait;
use meshforge::progress::{
    GenerationFailure, GenerationObserver, GenerationSuccess, ProgressUpdate,
};
use meshforge::provider::{PollSchedule, ProviderClient, ProviderId, ProviderRegistry};
use meshforge::{
    Credentials, ForgeError, GenerationOrchestrator, GenerationRequest, JobHandle, JobStatus,
    ModelResult,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Provider stub: every job reports Pending for `pending_polls` polls, then finishes.
pub struct StubClient {
    id: ProviderId,
    schedule: PollSchedule,
    pending_polls: u32,
    failing_prompts: Vec<String>,
    jobs: Mutex<HashMap<String, (String, u32)>>,
    pub submits: Mutex<Vec<String>>,
    pub polls: Mutex<u32>,
}

impl StubClient {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            schedule: PollSchedule::from_millis(1_000, 60_000),
            pending_polls: 1,
            failing_prompts: Vec::new(),
            jobs: Mutex::new(HashMap::new()),
            submits: Mutex::new(Vec::new()),
            polls: Mutex::new(0),
        }
    }

    pub fn with_pending_polls(mut self, pending_polls: u32) -> Self {
        self.pending_polls = pending_polls;
        self
    }

    pub fn failing_on(mut self, prompt: &str) -> Self {
        self.failing_prompts.push(prompt.to_string());
        self
    }

    pub fn submit_count(&self) -> usize {
        self.submits.lock().len()
    }

    pub fn poll_count(&self) -> u32 {
        *self.polls.lock()
    }

    pub fn network_calls(&self) -> usize {
        self.submit_count() + self.poll_count() as usize
    }
}

#[async_trait]
impl ProviderClient for StubClient {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn poll_schedule(&self) -> PollSchedule {
        self.schedule
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
        _api_key: &str,
    ) -> Result<JobHandle, ForgeError> {
        let mut submits = self.submits.lock();
        submits.push(request.provider_prompt());
        let handle = format!("job-{}", submits.len());
        self.jobs
            .lock()
            .insert(handle.clone(), (request.prompt().to_string(), 0));
        Ok(JobHandle::new(handle))
    }

    async fn poll(&self, handle: &JobHandle, _api_key: &str) -> Result<JobStatus, ForgeError> {
        *self.polls.lock() += 1;
        let mut jobs = self.jobs.lock();
        let (prompt, polls) = jobs.get_mut(handle.as_str()).ok_or_else(|| ForgeError::Protocol {
            provider: self.id,
            message: format!("unknown job {}", handle),
        })?;
        *polls += 1;
        if *polls <= self.pending_polls {
            return Ok(JobStatus::Pending);
        }
        if self.failing_prompts.iter().any(|p| p.as_str() == prompt.as_str()) {
            return Ok(JobStatus::Failed("rejected by provider".to_string()));
        }
        let url = format!("https://cdn.example.com/{}.glb", handle);
        Ok(JobStatus::Succeeded(ModelResult::new(self.id, &url, None, None)?))
    }
}

/// Records every notification for later assertions.
#[derive(Default)]
pub struct Recorder {
    pub progress: Mutex<Vec<ProgressUpdate>>,
    pub successes: Mutex<Vec<GenerationSuccess>>,
    pub failures: Mutex<Vec<GenerationFailure>>,
}

impl Recorder {
    pub fn terminal_count(&self) -> usize {
        self.successes.lock().len() + self.failures.lock().len()
    }
}

impl GenerationObserver for Recorder {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.progress.lock().push(update.clone());
    }

    fn on_success(&self, success: &GenerationSuccess) {
        self.successes.lock().push(success.clone());
    }

    fn on_failure(&self, failure: &GenerationFailure) {
        self.failures.lock().push(failure.clone());
    }
}

pub fn orchestrator_with(
    client: Arc<StubClient>,
    credentials: Credentials,
    observer: Arc<dyn GenerationObserver>,
) -> GenerationOrchestrator {
    let mut registry = ProviderRegistry::new();
    registry.register(client);
    GenerationOrchestrator::new(registry, credentials).with_observer(observer)
}

static XDG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    vars: Vec<(&'static str, Option<String>)>,
}

const ISOLATED_VARS: [&str; 6] = [
    "HOME",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "MESHY_API_KEY",
    "TRIPO_API_KEY",
    "CSM_API_KEY",
];

impl EnvState {
    fn capture() -> Self {
        Self {
            vars: ISOLATED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (name, value) in self.vars {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG directories pointed into `test_dir` and provider key
/// variables cleared. Access is serialized; the environment is restored afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().join("config");
    let test_data_home = test_dir.path().join("data");
    let test_home = test_dir.path().join("home");
    for dir in [&test_config_home, &test_data_home, &test_home] {
        std::fs::create_dir_all(dir).unwrap();
    }

    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);
    std::env::set_var("XDG_DATA_HOME", &test_data_home);
    for name in ["MESHY_API_KEY", "TRIPO_API_KEY", "CSM_API_KEY"] {
        std::env::remove_var(name);
    }

    let result = f();

    env_state.restore();

    result
}
