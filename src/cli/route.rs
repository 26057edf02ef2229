//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::batch::{parse_prompts, BatchRunner};
use crate::cli::help::command_name;
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_batch_summary, format_generation_result, format_history_text,
    format_provider_list_json, format_provider_list_text, ConsoleObserver,
};
use crate::config::{ConfigLoader, ForgeConfig};
use crate::credentials::{CredentialStore, Credentials};
use crate::download::AssetDownloader;
use crate::enhance::{enhance_prompt, PromptStyle};
use crate::error::ForgeError;
use crate::history::{HistoryRecorder, HistoryStore};
use crate::orchestrator::GenerationOrchestrator;
use crate::progress::{ObserverSet, TracingObserver};
use crate::provider::ProviderId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// Runtime context for CLI execution: loaded config, data directory and async runtime.
pub struct RunContext {
    config: ForgeConfig,
    data_dir: PathBuf,
    runtime: Runtime,
}

impl RunContext {
    /// Create run context from an optional explicit config path. Uses ConfigLoader only.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ForgeError> {
        let config = ConfigLoader::load(config_path.as_deref())?.validated()?;
        Self::from_config(config)
    }

    pub fn from_config(config: ForgeConfig) -> Result<Self, ForgeError> {
        let data_dir = config.storage.resolve_data_dir();
        let runtime = Runtime::new()
            .map_err(|e| ForgeError::Config(format!("Failed to create runtime: {}", e)))?;
        debug!(data_dir = %data_dir.display(), "Run context ready");
        Ok(Self {
            config,
            data_dir,
            runtime,
        })
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ForgeError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = name, "Executing command");
        let result = self.execute_inner(command);
        info!(
            command = name,
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ForgeError> {
        match command {
            Commands::Generate {
                prompt,
                provider,
                style,
                output,
                format,
            } => self.handle_generate(prompt, *provider, *style, output.as_deref(), format),
            Commands::Batch {
                file,
                prompts,
                provider,
                delay_ms,
                auto_download,
                output,
            } => self.handle_batch(
                file.as_deref(),
                prompts,
                *provider,
                *delay_ms,
                *auto_download,
                output.clone(),
            ),
            Commands::Providers { format } => self.handle_providers(format),
            Commands::Configure {
                provider,
                key,
                activate,
            } => self.handle_configure(*provider, key.clone(), *activate),
            Commands::Enhance { prompt, style } => Ok(self.handle_enhance(prompt, *style)),
            Commands::History { limit, clear } => self.handle_history(*limit, *clear),
        }
    }

    fn credential_store(&self) -> CredentialStore {
        CredentialStore::in_dir(&self.data_dir)
    }

    fn history_store(&self) -> HistoryStore {
        HistoryStore::in_dir(&self.data_dir)
    }

    /// Saved keys overlaid with config/env keys, and the active provider (config wins).
    fn session_credentials(&self) -> Result<(Credentials, Option<ProviderId>), ForgeError> {
        let saved = self.credential_store().load()?;
        let mut credentials = saved.keys;
        credentials.merge(&self.config.credentials());
        let active = self.config.active_provider()?.or(saved.active_provider);
        Ok((credentials, active))
    }

    fn orchestrator(&self, provider: Option<ProviderId>) -> Result<GenerationOrchestrator, ForgeError> {
        let (credentials, active) = self.session_credentials()?;
        let observers = ObserverSet::new()
            .with(Arc::new(ConsoleObserver))
            .with(Arc::new(HistoryRecorder::new(self.history_store())))
            .with(Arc::new(TracingObserver));
        Ok(
            GenerationOrchestrator::new(self.config.build_registry()?, credentials)
                .with_active_provider(provider.or(active))
                .with_observer(Arc::new(observers)),
        )
    }

    fn handle_generate(
        &self,
        prompt: &str,
        provider: Option<ProviderId>,
        style: Option<PromptStyle>,
        output: Option<&Path>,
        format: &str,
    ) -> Result<String, ForgeError> {
        let orchestrator = self.orchestrator(provider)?;
        let hints = style.map(|s| s.terms().to_string());
        let result = self
            .runtime
            .block_on(orchestrator.generate_styled(prompt, hints))?;

        let saved_to = match output {
            Some(dir) => {
                let downloader = AssetDownloader::new(dir)?;
                Some(
                    self.runtime
                        .block_on(downloader.download(prompt, None, &result))?,
                )
            }
            None => None,
        };
        format_generation_result(&result, saved_to.as_deref(), format)
    }

    fn handle_batch(
        &self,
        file: Option<&Path>,
        args: &[String],
        provider: Option<ProviderId>,
        delay_ms: Option<u64>,
        auto_download: bool,
        output: Option<PathBuf>,
    ) -> Result<String, ForgeError> {
        let mut prompts = Vec::new();
        if let Some(file) = file {
            let text = std::fs::read_to_string(file).map_err(|e| {
                ForgeError::Storage(format!("Failed to read {}: {}", file.display(), e))
            })?;
            prompts.extend(parse_prompts(&text));
        }
        prompts.extend(args.iter().cloned());

        let delay = delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.config.batch.delay());
        let auto_advance = auto_download || self.config.batch.auto_download;
        let output_dir = output.unwrap_or_else(|| self.config.batch.output_dir.clone());

        let orchestrator = self.orchestrator(provider)?;
        let mut runner = BatchRunner::new().with_observer(Arc::new(ConsoleObserver));
        if auto_advance {
            runner = runner.with_post_success_hook(Arc::new(AssetDownloader::new(output_dir)?));
        }
        let runner = Arc::new(runner);

        let outcome = self.runtime.block_on(async {
            let stopper = Arc::clone(&runner);
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stopper.stop();
                }
            });
            let outcome = runner
                .start(&orchestrator, prompts, delay, auto_advance)
                .await;
            interrupt.abort();
            outcome
        })?;

        Ok(format_batch_summary(&runner.jobs(), &outcome))
    }

    fn handle_providers(&self, format: &str) -> Result<String, ForgeError> {
        let (credentials, active) = self.session_credentials()?;
        let orchestrator = GenerationOrchestrator::new(self.config.build_registry()?, credentials)
            .with_active_provider(active);
        let statuses = orchestrator.provider_statuses();
        if format == "json" {
            Ok(format_provider_list_json(&statuses))
        } else {
            Ok(format_provider_list_text(&statuses))
        }
    }

    fn handle_configure(
        &self,
        provider: ProviderId,
        key: Option<String>,
        activate: bool,
    ) -> Result<String, ForgeError> {
        let key = match key {
            Some(key) => key,
            None => dialoguer::Password::new()
                .with_prompt(format!("{} API key", provider.display_name()))
                .allow_empty_password(true)
                .interact()
                .map_err(|e| ForgeError::Config(format!("Failed to read API key: {}", e)))?,
        };

        let store = self.credential_store();
        let mut saved = store.load()?;
        saved.keys.set(provider, key);
        let configured = saved.keys.is_configured(provider);
        if activate || (configured && saved.active_provider.is_none()) {
            saved.active_provider = Some(provider);
        }
        store.save(&saved)?;
        info!(provider = %provider, configured, "Credentials updated");

        let mut out = if configured {
            format!("Saved {} API key to {}", provider.display_name(), store.path().display())
        } else {
            format!("Removed {} API key", provider.display_name())
        };
        if saved.active_provider == Some(provider) {
            out.push_str(&format!("\nActive provider: {}", provider));
        }
        Ok(out)
    }

    fn handle_enhance(&self, prompt: &str, style: PromptStyle) -> String {
        enhance_prompt(prompt, style)
    }

    fn handle_history(&self, limit: usize, clear: bool) -> Result<String, ForgeError> {
        let store = self.history_store();
        if clear {
            store.clear()?;
            return Ok("History cleared.".to_string());
        }
        let entries: Vec<_> = store.load()?.into_iter().take(limit).collect();
        Ok(format_history_text(&entries))
    }
}
