//! Meshforge CLI Binary
//!
//! Command-line interface for text-to-3D generation across remote providers.

use anyhow::Context;
use clap::Parser;
use meshforge::cli::{map_error, Cli, RunContext};
use meshforge::config::ConfigLoader;
use meshforge::logging::{init_logging, LoggingConfig};
use meshforge::ForgeError;
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            // Domain errors carry their own next-step hints.
            match e.downcast_ref::<ForgeError>() {
                Some(forge) => eprintln!("{}", map_error(forge)),
                None => eprintln!("Error: {:#}", e),
            }
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(cli);
    init_logging(Some(&logging_config)).context("Failed to initialize logging")?;

    info!("Meshforge CLI starting");

    let context = RunContext::new(cli.config.clone())?;
    Ok(context.execute(&cli.command)?)
}

/// Build logging configuration from CLI args and the config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = ConfigLoader::load(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();

    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
        if cli.log_output.is_none() {
            config.output = "file".to_string();
        }
    }

    config
}
