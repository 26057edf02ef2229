//! Text-to-3D Provider Abstraction
//!
//! Unified interface over the remote generation services (Meshy, Tripo, CSM). Each provider
//! implements the same two-call capability set: `submit` creates a job and `poll` performs
//! exactly one status round trip, mapping the provider's own status vocabulary onto the
//! shared [`JobStatus`]. Looping, sleeping and timeouts live in [`crate::poller`].

use crate::error::ForgeError;
use crate::job::{GenerationRequest, JobHandle, JobStatus};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub mod csm;
pub mod meshy;
pub mod tripo;

pub use csm::CsmClient;
pub use meshy::MeshyClient;
pub use tripo::TripoClient;

/// Supported providers, in selection-preference order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Meshy,
    Tripo,
    Csm,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::Meshy, ProviderId::Tripo, ProviderId::Csm];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Meshy => "meshy",
            ProviderId::Tripo => "tripo",
            ProviderId::Csm => "csm",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Meshy => "MESHY AI",
            ProviderId::Tripo => "TRIPO AI",
            ProviderId::Csm => "CSM AI",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            ProviderId::Meshy => "MESHY_API_KEY",
            ProviderId::Tripo => "TRIPO_API_KEY",
            ProviderId::Csm => "CSM_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meshy" => Ok(ProviderId::Meshy),
            "tripo" => Ok(ProviderId::Tripo),
            "csm" => Ok(ProviderId::Csm),
            other => Err(ForgeError::Config(format!(
                "Unknown provider: {}. Must be meshy, tripo, or csm",
                other
            ))),
        }
    }
}

/// Poll cadence and wall-clock ceiling for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl PollSchedule {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5_000);
    pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(300_000);

    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    pub fn from_millis(interval_ms: u64, max_wait_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(interval_ms),
            Duration::from_millis(max_wait_ms),
        )
    }

    /// Apply optional overrides on top of this schedule.
    pub fn with_overrides(self, interval_ms: Option<u64>, max_wait_ms: Option<u64>) -> Self {
        Self {
            interval: interval_ms.map(Duration::from_millis).unwrap_or(self.interval),
            max_wait: max_wait_ms.map(Duration::from_millis).unwrap_or(self.max_wait),
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL, Self::DEFAULT_MAX_WAIT)
    }
}

/// Remote text-to-3D service client.
///
/// Credentials are passed per call and only ever sent to this provider's own endpoints.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Recommended poll cadence for this provider.
    fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::default()
    }

    /// Create a generation job.
    async fn submit(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<JobHandle, ForgeError>;

    /// Issue a single status check. Must not loop or sleep.
    async fn poll(&self, handle: &JobHandle, api_key: &str) -> Result<JobStatus, ForgeError>;
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_provider_http_client(provider: ProviderId) -> Result<Client, ForgeError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .user_agent(concat!("meshforge/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ForgeError::Request {
            provider,
            message: format!("Failed to create HTTP client: {}", e),
        })
}

pub(crate) fn require_api_key(provider: ProviderId, api_key: &str) -> Result<(), ForgeError> {
    if api_key.trim().is_empty() {
        return Err(ForgeError::Auth {
            provider,
            message: "API key is empty".to_string(),
        });
    }
    Ok(())
}

// Helper function to map transport failures to ForgeError
pub(crate) fn map_transport_error(provider: ProviderId, error: reqwest::Error) -> ForgeError {
    let message = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    ForgeError::Request { provider, message }
}

/// Pull a human-readable message out of a provider error body.
///
/// Understands `{"message": ..}`, `{"error": ".."}`, `{"error": {"message": ..}}` and
/// `{"detail": ..}` shapes.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let candidate = value
        .get("message")
        .or_else(|| value.get("detail"))
        .or_else(|| value.get("error").and_then(|e| e.get("message")))
        .or_else(|| value.get("error"))?;
    candidate
        .as_str()
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

/// Classify a non-success HTTP status with its body.
pub fn status_error(provider: ProviderId, status: StatusCode, body: &str) -> ForgeError {
    let detail = extract_error_message(body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });
    match status.as_u16() {
        401 | 403 => ForgeError::Auth {
            provider,
            message: format!("Authentication failed: {}", detail),
        },
        _ => ForgeError::Request {
            provider,
            message: format!("Request failed with status {}: {}", status.as_u16(), detail),
        },
    }
}

/// Pass through successful responses; turn anything else into a classified error.
pub(crate) async fn ensure_success(
    provider: ProviderId,
    response: Response,
) -> Result<Response, ForgeError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(provider, status, &body))
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    provider: ProviderId,
    response: Response,
) -> Result<T, ForgeError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_transport_error(provider, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ForgeError::Protocol {
        provider,
        message: format!("Failed to parse response: {}", e),
    })
}

/// `{collection}/{handle}` with the handle percent-encoded as a single path segment.
pub(crate) fn job_url(
    provider: ProviderId,
    collection: &str,
    handle: &JobHandle,
) -> Result<Url, ForgeError> {
    let invalid = |message: String| ForgeError::Request { provider, message };
    let mut url = Url::parse(collection)
        .map_err(|e| invalid(format!("Invalid endpoint '{}': {}", collection, e)))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("Endpoint '{}' cannot take a path", collection)))?
        .pop_if_empty()
        .push(handle.as_str());
    Ok(url)
}

pub(crate) fn unmapped_status(provider: ProviderId, status: &str) -> ForgeError {
    ForgeError::Protocol {
        provider,
        message: format!("unrecognized job status '{}'", status),
    }
}

/// Factory for the built-in provider clients.
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: ProviderId,
        base_url: Option<String>,
    ) -> Result<Arc<dyn ProviderClient>, ForgeError> {
        let client: Arc<dyn ProviderClient> = match provider {
            ProviderId::Meshy => Arc::new(MeshyClient::new(base_url)?),
            ProviderId::Tripo => Arc::new(TripoClient::new(base_url)?),
            ProviderId::Csm => Arc::new(CsmClient::new()),
        };
        Ok(client)
    }
}

/// Provider clients keyed by [`ProviderId`], with optional per-provider schedule overrides.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<ProviderId, Arc<dyn ProviderClient>>,
    schedules: HashMap<ProviderId, PollSchedule>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider on its default endpoint.
    pub fn standard() -> Result<Self, ForgeError> {
        let mut registry = Self::new();
        for provider in ProviderId::ALL {
            registry.register(ProviderFactory::create_client(provider, None)?);
        }
        Ok(registry)
    }

    /// Add or replace the client for its provider id.
    pub fn register(&mut self, client: Arc<dyn ProviderClient>) {
        self.clients.insert(client.id(), client);
    }

    pub fn set_schedule(&mut self, provider: ProviderId, schedule: PollSchedule) {
        self.schedules.insert(provider, schedule);
    }

    pub fn get(&self, provider: ProviderId) -> Option<Arc<dyn ProviderClient>> {
        self.clients.get(&provider).cloned()
    }

    pub fn get_or_error(&self, provider: ProviderId) -> Result<Arc<dyn ProviderClient>, ForgeError> {
        self.get(provider)
            .ok_or(ForgeError::NotImplemented { provider })
    }

    /// Effective schedule: configured override, else the client's recommendation.
    pub fn schedule_for(&self, provider: ProviderId) -> PollSchedule {
        self.schedules
            .get(&provider)
            .copied()
            .or_else(|| self.clients.get(&provider).map(|c| c.poll_schedule()))
            .unwrap_or_default()
    }

    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.clients.keys().copied().collect();
        ids.sort();
        ids
    }
}
