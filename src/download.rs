//! Saves generated assets to disk. Doubles as the batch auto-download hook.

use crate::batch::{BatchJob, PostSuccessHook};
use crate::error::ForgeError;
use crate::job::ModelResult;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
const MAX_SLUG_LEN: usize = 48;

pub struct AssetDownloader {
    client: Client,
    output_dir: PathBuf,
}

impl AssetDownloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, ForgeError> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .user_agent(concat!("meshforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForgeError::Storage(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetch the asset and write it under the output directory. Returns the written path.
    pub async fn download(
        &self,
        prompt: &str,
        index: Option<usize>,
        result: &ModelResult,
    ) -> Result<PathBuf, ForgeError> {
        let response = self
            .client
            .get(result.asset_url())
            .send()
            .await
            .map_err(|e| ForgeError::Storage(format!("Failed to download model: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ForgeError::Storage(format!(
                "Failed to download model: HTTP {}",
                status.as_u16()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ForgeError::Storage(format!("Failed to download model: {}", e)))?;

        self.save(&asset_file_name(prompt, index, result), &bytes)
            .await
    }

    /// Write `bytes` as `file_name` under the output directory, creating it if needed.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ForgeError> {
        let path = self.output_dir.join(file_name);
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Model saved");
        Ok(path)
    }
}

#[async_trait]
impl PostSuccessHook for AssetDownloader {
    async fn after_success(&self, job: &BatchJob, result: &ModelResult) -> Result<(), ForgeError> {
        self.download(&job.prompt, Some(job.index), result).await?;
        Ok(())
    }
}

/// `{index:02}-{slug}.{ext}` for batch jobs, `{slug}.{ext}` otherwise.
pub fn asset_file_name(prompt: &str, index: Option<usize>, result: &ModelResult) -> String {
    let slug = slugify(prompt);
    let ext = result.format().extension();
    match index {
        Some(index) => format!("{:02}-{}.{}", index + 1, slug, ext),
        None => format!("{}.{}", slug, ext),
    }
}

fn slugify(prompt: &str) -> String {
    let mut slug = String::new();
    for ch in prompt.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "model".to_string()
    } else {
        slug.to_string()
    }
}
