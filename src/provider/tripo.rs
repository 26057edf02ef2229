//! Tripo text-to-model client (`/v2/openapi/task`).

use super::{
    build_provider_http_client, decode_json, ensure_success, job_url, map_transport_error,
    require_api_key, unmapped_status, PollSchedule, ProviderClient, ProviderId,
};
use crate::error::ForgeError;
use crate::job::{GenerationRequest, JobHandle, JobStatus, ModelResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.tripo3d.ai/v2/openapi";

const TASK_TYPE: &str = "text_to_model";
const MODEL_VERSION: &str = "v2.0-20240919";

#[derive(Serialize)]
struct CreateTaskRequest<'a> {
    #[serde(rename = "type")]
    task_type: &'a str,
    prompt: &'a str,
    model_version: &'a str,
}

/// Tripo wraps every payload as `{"code": 0, "data": {...}}`.
#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct CreatedTask {
    task_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TripoTask {
    status: String,
    #[serde(default)]
    output: Option<TripoOutput>,
    #[serde(default)]
    running_left_time: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct TripoOutput {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    pbr_model: Option<String>,
    #[serde(default)]
    rendered_image: Option<String>,
}

/// Tripo provider client
pub struct TripoClient {
    client: Client,
    base_url: String,
}

impl TripoClient {
    pub fn new(base_url: Option<String>) -> Result<Self, ForgeError> {
        let client = build_provider_http_client(ProviderId::Tripo)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self { client, base_url })
    }

    fn task_url(&self) -> String {
        format!("{}/task", self.base_url)
    }

    fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ForgeError> {
        let provider = ProviderId::Tripo;
        if envelope.code != 0 {
            return Err(ForgeError::Request {
                provider,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("Tripo API error code {}", envelope.code)),
            });
        }
        envelope.data.ok_or_else(|| ForgeError::Protocol {
            provider,
            message: "response has no data field".to_string(),
        })
    }

    /// Map a Tripo task document onto the shared status.
    pub(crate) fn map_task(task: TripoTask) -> Result<JobStatus, ForgeError> {
        let provider = ProviderId::Tripo;
        match task.status.as_str() {
            "queued" => Ok(JobStatus::Pending),
            "running" => {
                if let Some(left) = task.running_left_time {
                    debug!(provider = %provider, running_left_time = left, "Tripo task running");
                }
                Ok(JobStatus::Running { elapsed_ms: None })
            }
            "success" => {
                let output = task.output.unwrap_or_default();
                let url = output
                    .model
                    .filter(|url| !url.is_empty())
                    .or(output.pbr_model)
                    .ok_or_else(|| ForgeError::Protocol {
                        provider,
                        message: "successful task has no output.model".to_string(),
                    })?;
                let result = ModelResult::new(provider, &url, None, output.rendered_image)?;
                Ok(JobStatus::Succeeded(result))
            }
            "failed" | "cancelled" | "banned" | "expired" => {
                Ok(JobStatus::Failed(format!("task {}", task.status)))
            }
            other => Err(unmapped_status(provider, other)),
        }
    }
}

#[async_trait]
impl ProviderClient for TripoClient {
    fn id(&self) -> ProviderId {
        ProviderId::Tripo
    }

    fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::from_millis(3_000, 300_000)
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<JobHandle, ForgeError> {
        require_api_key(self.id(), api_key)?;
        let prompt = request.provider_prompt();
        let body = CreateTaskRequest {
            task_type: TASK_TYPE,
            prompt: &prompt,
            model_version: MODEL_VERSION,
        };

        let response = self
            .client
            .post(self.task_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(self.id(), e))?;
        let response = ensure_success(self.id(), response).await?;
        let envelope: Envelope<CreatedTask> = decode_json(self.id(), response).await?;
        let created = Self::unwrap_envelope(envelope)?;
        debug!(provider = %self.id(), task_id = %created.task_id, "Tripo task created");
        Ok(JobHandle::new(created.task_id))
    }

    async fn poll(&self, handle: &JobHandle, api_key: &str) -> Result<JobStatus, ForgeError> {
        require_api_key(self.id(), api_key)?;
        let url = job_url(self.id(), &self.task_url(), handle)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| map_transport_error(self.id(), e))?;
        let response = ensure_success(self.id(), response).await?;
        let envelope: Envelope<TripoTask> = decode_json(self.id(), response).await?;
        Self::map_task(Self::unwrap_envelope(envelope)?)
    }
}
