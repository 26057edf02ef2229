//! Meshy text-to-3D client (`/openapi/v2/text-to-3d`).

use super::{
    build_provider_http_client, decode_json, ensure_success, job_url, map_transport_error,
    require_api_key, unmapped_status, PollSchedule, ProviderClient, ProviderId,
};
use crate::error::ForgeError;
use crate::job::{GenerationRequest, JobHandle, JobStatus, ModelFormat, ModelResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.meshy.ai/openapi/v2";

const ART_STYLE: &str = "realistic";
const NEGATIVE_PROMPT: &str = "low quality, blurry";

#[derive(Serialize)]
struct CreateTaskRequest<'a> {
    prompt: &'a str,
    art_style: &'a str,
    negative_prompt: &'a str,
}

#[derive(Deserialize)]
struct CreateTaskResponse {
    result: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeshyTask {
    status: String,
    #[serde(default)]
    model_urls: Option<MeshyModelUrls>,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    started_at: Option<i64>,
    #[serde(default)]
    task_error: Option<MeshyTaskError>,
}

#[derive(Debug, Deserialize)]
struct MeshyModelUrls {
    #[serde(default)]
    glb: Option<String>,
    #[serde(default)]
    obj: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeshyTaskError {
    #[serde(default)]
    message: Option<String>,
}

/// Meshy provider client
pub struct MeshyClient {
    client: Client,
    base_url: String,
}

impl MeshyClient {
    pub fn new(base_url: Option<String>) -> Result<Self, ForgeError> {
        let client = build_provider_http_client(ProviderId::Meshy)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self { client, base_url })
    }

    fn tasks_url(&self) -> String {
        format!("{}/text-to-3d", self.base_url)
    }

    /// Map a Meshy task document onto the shared status.
    pub(crate) fn map_task(task: MeshyTask, now_ms: i64) -> Result<JobStatus, ForgeError> {
        let provider = ProviderId::Meshy;
        match task.status.as_str() {
            "PENDING" => Ok(JobStatus::Pending),
            "IN_PROGRESS" => {
                let elapsed_ms = task
                    .started_at
                    .filter(|started| *started > 0 && *started <= now_ms)
                    .map(|started| (now_ms - started) as u64);
                Ok(JobStatus::Running { elapsed_ms })
            }
            "SUCCEEDED" => {
                let urls = task.model_urls.unwrap_or(MeshyModelUrls {
                    glb: None,
                    obj: None,
                });
                let (url, format) = match (urls.glb, urls.obj) {
                    (Some(glb), _) if !glb.is_empty() => (glb, ModelFormat::Glb),
                    (_, Some(obj)) if !obj.is_empty() => (obj, ModelFormat::Obj),
                    _ => {
                        return Err(ForgeError::Protocol {
                            provider,
                            message: "succeeded task has no model_urls.glb or model_urls.obj"
                                .to_string(),
                        })
                    }
                };
                let result = ModelResult::new(provider, &url, Some(format), task.thumbnail_url)?;
                Ok(JobStatus::Succeeded(result))
            }
            "FAILED" | "CANCELED" | "EXPIRED" => {
                let reason = task
                    .task_error
                    .and_then(|e| e.message)
                    .filter(|msg| !msg.trim().is_empty())
                    .unwrap_or_else(|| format!("task {}", task.status.to_ascii_lowercase()));
                Ok(JobStatus::Failed(reason))
            }
            other => Err(unmapped_status(provider, other)),
        }
    }
}

#[async_trait]
impl ProviderClient for MeshyClient {
    fn id(&self) -> ProviderId {
        ProviderId::Meshy
    }

    fn poll_schedule(&self) -> PollSchedule {
        PollSchedule::from_millis(5_000, 300_000)
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<JobHandle, ForgeError> {
        require_api_key(self.id(), api_key)?;
        let prompt = request.provider_prompt();
        let body = CreateTaskRequest {
            prompt: &prompt,
            art_style: ART_STYLE,
            negative_prompt: NEGATIVE_PROMPT,
        };

        let response = self
            .client
            .post(self.tasks_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(self.id(), e))?;
        let response = ensure_success(self.id(), response).await?;
        let created: CreateTaskResponse = decode_json(self.id(), response).await?;

        let task_id = created
            .result
            .or(created.id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ForgeError::Protocol {
                provider: self.id(),
                message: "create response has no task id".to_string(),
            })?;
        debug!(provider = %self.id(), task_id = %task_id, "Meshy task created");
        Ok(JobHandle::new(task_id))
    }

    async fn poll(&self, handle: &JobHandle, api_key: &str) -> Result<JobStatus, ForgeError> {
        require_api_key(self.id(), api_key)?;
        let url = job_url(self.id(), &self.tasks_url(), handle)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|e| map_transport_error(self.id(), e))?;
        let response = ensure_success(self.id(), response).await?;
        let task: MeshyTask = decode_json(self.id(), response).await?;
        Self::map_task(task, chrono::Utc::now().timestamp_millis())
    }
}
