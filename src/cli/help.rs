//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string for log records (e.g. "generate", "batch").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate { .. } => "generate",
        Commands::Batch { .. } => "batch",
        Commands::Providers { .. } => "providers",
        Commands::Configure { .. } => "configure",
        Commands::Enhance { .. } => "enhance",
        Commands::History { .. } => "history",
    }
}
