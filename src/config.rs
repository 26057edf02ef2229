//! Configuration System
//!
//! Layered configuration built with the `config` crate. Sources, lowest to highest precedence:
//! built-in defaults, the global `~/.config/meshforge/config.toml`, an explicit `--config`
//! file, `MESHFORGE__SECTION__KEY` environment overrides, and finally the provider key
//! variables (`MESHY_API_KEY`, `TRIPO_API_KEY`, `CSM_API_KEY`).

use crate::credentials::Credentials;
use crate::error::ForgeError;
use crate::logging::{LogFormat, LogOutput, LoggingConfig};
use crate::provider::{ProviderFactory, ProviderId, ProviderRegistry};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfig {
    /// Provider used when none is selected on the command line
    #[serde(default)]
    pub active_provider: Option<String>,

    /// Per-provider settings keyed by provider id (meshy, tripo, csm)
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,

    #[serde(default)]
    pub batch: BatchSettings,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Override the provider's API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    #[serde(default)]
    pub max_wait_ms: Option<u64>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_wait_ms", &self.max_wait_ms)
            .finish()
    }
}

impl ProviderSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == Some(0) {
            return Err("poll_interval_ms must be greater than zero".to_string());
        }
        if self.max_wait_ms == Some(0) {
            return Err("max_wait_ms must be greater than zero".to_string());
        }
        if let (Some(interval), Some(max_wait)) = (self.poll_interval_ms, self.max_wait_ms) {
            if max_wait < interval {
                return Err(format!(
                    "max_wait_ms ({}) is shorter than poll_interval_ms ({})",
                    max_wait, interval
                ));
            }
        }
        if let Some(base_url) = &self.base_url {
            let url = Url::parse(base_url)
                .map_err(|e| format!("Invalid base_url '{}': {}", base_url, e))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(format!("base_url '{}' must be http or https", base_url));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Wait between batch jobs
    #[serde(default = "default_batch_delay_ms")]
    pub delay_ms: u64,

    /// Save every successful batch result to `output_dir`
    #[serde(default)]
    pub auto_download: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_batch_delay_ms() -> u64 {
    3_000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("models")
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_batch_delay_ms(),
            auto_download: false,
            output_dir: default_output_dir(),
        }
    }
}

impl BatchSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for saved credentials and history. Defaults to the platform data dir.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl StorageSettings {
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "meshforge")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".meshforge"))
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Provider(String, String),
    Batch(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Batch(msg) => write!(f, "Batch: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ForgeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, settings) in &self.providers {
            if let Err(e) = name.parse::<ProviderId>() {
                errors.push(ValidationError::Provider(name.clone(), e.to_string()));
                continue;
            }
            if let Err(e) = settings.validate() {
                errors.push(ValidationError::Provider(name.clone(), e));
            }
        }

        if let Some(active) = &self.active_provider {
            if let Err(e) = active.parse::<ProviderId>() {
                errors.push(ValidationError::Provider(active.clone(), e.to_string()));
            }
        }

        if self.batch.output_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Batch(
                "output_dir cannot be empty".to_string(),
            ));
        }

        if let Err(e) = self.logging.format.parse::<LogFormat>() {
            errors.push(ValidationError::Logging(e.to_string()));
        }
        match self.logging.output.parse::<LogOutput>() {
            Ok(LogOutput::File) if self.logging.file.is_none() => errors.push(
                ValidationError::Logging("output 'file' requires logging.file".to_string()),
            ),
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::Logging(e.to_string())),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one `ForgeError::Config`.
    pub fn validated(self) -> Result<Self, ForgeError> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ForgeError::Config(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    pub fn active_provider(&self) -> Result<Option<ProviderId>, ForgeError> {
        self.active_provider.as_deref().map(str::parse).transpose()
    }

    pub fn provider(&self, provider: ProviderId) -> Option<&ProviderSettings> {
        self.providers.get(provider.as_str())
    }

    /// API keys set in configuration or the environment.
    pub fn credentials(&self) -> Credentials {
        let mut credentials = Credentials::new();
        for provider in ProviderId::ALL {
            if let Some(key) = self.provider(provider).and_then(|s| s.api_key.as_deref()) {
                credentials.set(provider, key);
            }
        }
        credentials
    }

    /// Registry with every built-in provider, honoring base URL and schedule overrides.
    pub fn build_registry(&self) -> Result<ProviderRegistry, ForgeError> {
        let mut registry = ProviderRegistry::new();
        for provider in ProviderId::ALL {
            let settings = self.provider(provider).cloned().unwrap_or_default();
            registry.register(ProviderFactory::create_client(provider, settings.base_url)?);
            if settings.poll_interval_ms.is_some() || settings.max_wait_ms.is_some() {
                let schedule = registry
                    .schedule_for(provider)
                    .with_overrides(settings.poll_interval_ms, settings.max_wait_ms);
                registry.set_schedule(provider, schedule);
            }
        }
        Ok(registry)
    }
}

/// Builds a [`ForgeConfig`] from the layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the global file, an optional explicit file, and the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<ForgeConfig, ForgeError> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_layers(global_config_path().as_deref(), explicit, &env)
    }

    /// Load defaults plus a single file, ignoring the global file and environment.
    pub fn load_from_file(path: &Path) -> Result<ForgeConfig, ForgeError> {
        Self::load_layers(None, Some(path), &HashMap::new())
    }

    pub fn load_layers(
        global: Option<&Path>,
        explicit: Option<&Path>,
        env: &HashMap<String, String>,
    ) -> Result<ForgeConfig, ForgeError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder, global)?;
        let builder = sources::explicit_file::add_to_builder(builder, explicit)?;
        let builder = sources::environment::add_to_builder(builder, env)?;
        let config: ForgeConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }
}
