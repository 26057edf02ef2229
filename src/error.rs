//! Error types for the Meshforge generation pipeline.

use crate::provider::ProviderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while validating, submitting, polling, or sequencing generation jobs.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    #[error("Prompt is empty. Enter a description of the model to generate.")]
    EmptyPrompt,

    #[error("No provider API key is configured. Run `meshforge configure --provider <name>` first.")]
    NoCredentials,

    #[error("Provider {provider} has no API key configured")]
    ProviderNotConfigured { provider: ProviderId },

    #[error("Provider {provider} rejected the credentials: {message}")]
    Auth { provider: ProviderId, message: String },

    #[error("Provider {provider} request failed: {message}")]
    Request { provider: ProviderId, message: String },

    #[error("Provider {provider} sent an unexpected response: {message}")]
    Protocol { provider: ProviderId, message: String },

    #[error("Model generation failed on {provider} after {}s: {reason}", elapsed_ms / 1000)]
    GenerationFailed {
        provider: ProviderId,
        reason: String,
        elapsed_ms: u64,
    },

    #[error("Generation timeout on {provider} after {}s", elapsed_ms / 1000)]
    GenerationTimeout { provider: ProviderId, elapsed_ms: u64 },

    #[error("{provider} integration is not implemented yet. Use meshy or tripo for now.")]
    NotImplemented { provider: ProviderId },

    #[error("A generation is already in progress")]
    AlreadyGenerating,

    #[error("A batch run is already in progress")]
    BatchAlreadyRunning,

    #[error("Batch contains no prompts")]
    EmptyBatch,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Stable error category handed to failure sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyPrompt,
    NoCredentials,
    ProviderNotConfigured,
    Auth,
    Request,
    Protocol,
    GenerationFailed,
    GenerationTimeout,
    NotImplemented,
    AlreadyGenerating,
    BatchAlreadyRunning,
    EmptyBatch,
    Config,
    Storage,
}

impl ForgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForgeError::EmptyPrompt => ErrorKind::EmptyPrompt,
            ForgeError::NoCredentials => ErrorKind::NoCredentials,
            ForgeError::ProviderNotConfigured { .. } => ErrorKind::ProviderNotConfigured,
            ForgeError::Auth { .. } => ErrorKind::Auth,
            ForgeError::Request { .. } => ErrorKind::Request,
            ForgeError::Protocol { .. } => ErrorKind::Protocol,
            ForgeError::GenerationFailed { .. } => ErrorKind::GenerationFailed,
            ForgeError::GenerationTimeout { .. } => ErrorKind::GenerationTimeout,
            ForgeError::NotImplemented { .. } => ErrorKind::NotImplemented,
            ForgeError::AlreadyGenerating => ErrorKind::AlreadyGenerating,
            ForgeError::BatchAlreadyRunning => ErrorKind::BatchAlreadyRunning,
            ForgeError::EmptyBatch => ErrorKind::EmptyBatch,
            ForgeError::Config(_) => ErrorKind::Config,
            ForgeError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Provider the error is attributed to, if any.
    pub fn provider(&self) -> Option<ProviderId> {
        match self {
            ForgeError::ProviderNotConfigured { provider }
            | ForgeError::Auth { provider, .. }
            | ForgeError::Request { provider, .. }
            | ForgeError::Protocol { provider, .. }
            | ForgeError::GenerationFailed { provider, .. }
            | ForgeError::GenerationTimeout { provider, .. }
            | ForgeError::NotImplemented { provider } => Some(*provider),
            _ => None,
        }
    }

    /// True for errors raised before any network call was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EmptyPrompt
                | ErrorKind::NoCredentials
                | ErrorKind::ProviderNotConfigured
                | ErrorKind::AlreadyGenerating
        )
    }
}

impl From<config::ConfigError> for ForgeError {
    fn from(err: config::ConfigError) -> Self {
        ForgeError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ForgeError {
    fn from(err: std::io::Error) -> Self {
        ForgeError::Storage(err.to_string())
    }
}
