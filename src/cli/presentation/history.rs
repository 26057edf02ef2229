//! History presentation.

use crate::cli::presentation::shared::format_section_heading;
use crate::history::{HistoryEntry, HistoryStatus};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;

pub fn format_history_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No generation history yet.".to_string();
    }
    let mut out = format!("{}\n\n", format_section_heading("History"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["When", "Prompt", "Provider", "Duration", "Status"]);
    for entry in entries {
        let status = match entry.status {
            HistoryStatus::Success => "success",
            HistoryStatus::Failed => "failed",
        };
        table.add_row(vec![
            entry.recorded_at.format("%Y-%m-%d %H:%M").to_string(),
            entry.prompt.clone(),
            entry
                .provider
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{}s", entry.duration_secs),
            status.to_string(),
        ]);
    }
    out.push_str(&table.to_string());
    out
}
