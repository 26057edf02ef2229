//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_batch_summary, format_generation_result, format_history_text,
    format_provider_list_json, format_provider_list_text, format_section_heading,
    ConsoleObserver,
};
pub use route::RunContext;
