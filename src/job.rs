//! Job data model: requests, opaque handles, provider-neutral status and results.

use crate::error::ForgeError;
use crate::provider::ProviderId;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One text-to-3D generation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    prompt: String,
    provider: ProviderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    style_hints: Option<String>,
}

impl GenerationRequest {
    /// Build a request; the prompt is trimmed and must not be empty.
    pub fn new(
        prompt: &str,
        provider: ProviderId,
        style_hints: Option<String>,
    ) -> Result<Self, ForgeError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ForgeError::EmptyPrompt);
        }
        let style_hints = style_hints
            .map(|hints| hints.trim().to_string())
            .filter(|hints| !hints.is_empty());
        Ok(Self {
            prompt: prompt.to_string(),
            provider,
            style_hints,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn style_hints(&self) -> Option<&str> {
        self.style_hints.as_deref()
    }

    /// Text sent to the provider: the prompt followed by any style hints.
    pub fn provider_prompt(&self) -> String {
        match &self.style_hints {
            Some(hints) => format!("{}, {}", self.prompt, hints),
            None => self.prompt.clone(),
        }
    }
}

/// Provider-issued job identifier. Never interpreted outside the issuing client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single status check.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    /// Provider reports the job as running; elapsed time when the provider exposes it.
    Running { elapsed_ms: Option<u64> },
    Succeeded(ModelResult),
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded(_) | JobStatus::Failed(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    Glb,
    Obj,
}

impl ModelFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ModelFormat::Glb => "glb",
            ModelFormat::Obj => "obj",
        }
    }

    /// Infer the format from the path extension of an asset URL.
    pub fn from_url(url: &Url) -> Option<Self> {
        let last = url.path_segments()?.last()?;
        let (_, ext) = last.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "glb" | "gltf" => Some(ModelFormat::Glb),
            "obj" => Some(ModelFormat::Obj),
            _ => None,
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The generated asset handed to viewer and history collaborators.
///
/// `asset_url` is always an absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResult {
    asset_url: String,
    format: ModelFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail_url: Option<String>,
}

impl ModelResult {
    /// Validate and normalize a provider asset.
    ///
    /// The format falls back to the URL extension, then to glb when neither the provider
    /// nor the URL names one.
    pub fn new(
        provider: ProviderId,
        asset_url: &str,
        format: Option<ModelFormat>,
        thumbnail_url: Option<String>,
    ) -> Result<Self, ForgeError> {
        let url = parse_absolute_url(provider, asset_url)?;
        let format = format
            .or_else(|| ModelFormat::from_url(&url))
            .unwrap_or(ModelFormat::Glb);
        let thumbnail_url = thumbnail_url
            .filter(|thumb| !thumb.trim().is_empty())
            .and_then(|thumb| parse_absolute_url(provider, &thumb).ok())
            .map(String::from);
        Ok(Self {
            asset_url: url.into(),
            format,
            thumbnail_url,
        })
    }

    pub fn asset_url(&self) -> &str {
        &self.asset_url
    }

    pub fn format(&self) -> ModelFormat {
        self.format
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    /// Let the asset URL extension win when it disagrees with the recorded format.
    pub fn normalized(self) -> Self {
        let inferred = Url::parse(&self.asset_url)
            .ok()
            .and_then(|url| ModelFormat::from_url(&url));
        match inferred {
            Some(format) if format != self.format => Self { format, ..self },
            _ => self,
        }
    }
}

fn parse_absolute_url(provider: ProviderId, raw: &str) -> Result<Url, ForgeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ForgeError::Protocol {
            provider,
            message: "completed job has no asset URL".to_string(),
        });
    }
    let url = Url::parse(raw).map_err(|e| ForgeError::Protocol {
        provider,
        message: format!("asset URL '{}' is not absolute: {}", raw, e),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ForgeError::Protocol {
            provider,
            message: format!("asset URL uses unsupported scheme '{}'", other),
        }),
    }
}
