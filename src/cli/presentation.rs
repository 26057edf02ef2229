//! CLI presentation: text and json formatters per command family, plus live console sinks.

mod console;
mod generation;
mod history;
mod provider;
mod shared;

pub use console::ConsoleObserver;
pub use generation::{format_batch_summary, format_generation_result};
pub use history::format_history_text;
pub use provider::{format_provider_list_json, format_provider_list_text};
pub use shared::format_section_heading;
