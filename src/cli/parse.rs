//! CLI parse: clap types for Meshforge. No behavior; definitions only.

use crate::enhance::PromptStyle;
use crate::provider::ProviderId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Meshforge CLI - text-to-3D generation across remote providers
#[derive(Parser)]
#[command(name = "meshforge")]
#[command(about = "Generate 3D models from text prompts with Meshy, Tripo and CSM", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over ~/.config/meshforge/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (implies file output)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one model from a prompt
    Generate {
        /// Text description of the model
        prompt: String,
        /// Provider to use (default: active provider)
        #[arg(long, value_enum)]
        provider: Option<ProviderId>,
        /// Append style terms to the prompt sent to the provider
        #[arg(long, value_enum)]
        style: Option<PromptStyle>,
        /// Save the generated model into this directory
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Run several prompts one after another
    Batch {
        /// File with one prompt per line
        #[arg(long)]
        file: Option<PathBuf>,
        /// Prompts given on the command line
        prompts: Vec<String>,
        /// Provider to use (default: active provider)
        #[arg(long, value_enum)]
        provider: Option<ProviderId>,
        /// Wait between jobs in milliseconds (default: batch.delay_ms)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Save every successful model to the output directory
        #[arg(long)]
        auto_download: bool,
        /// Output directory for auto-download (default: batch.output_dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List providers and whether each has an API key
    Providers {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Store a provider API key
    Configure {
        #[arg(long, value_enum)]
        provider: ProviderId,
        /// API key (prompted for when omitted; an empty key removes the stored one)
        #[arg(long)]
        key: Option<String>,
        /// Make this the active provider
        #[arg(long)]
        activate: bool,
    },
    /// Expand a short prompt with style terms
    Enhance {
        prompt: String,
        #[arg(long, value_enum)]
        style: PromptStyle,
    },
    /// Show recent generations
    History {
        /// Maximum entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Delete the stored history
        #[arg(long)]
        clear: bool,
    },
}
