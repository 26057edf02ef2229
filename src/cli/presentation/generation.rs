//! Generation and batch result presentation.

use crate::batch::{BatchJob, BatchJobStatus, BatchOutcome};
use crate::cli::presentation::shared::format_section_heading;
use crate::error::ForgeError;
use crate::job::ModelResult;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;
use std::path::Path;

pub fn format_generation_result(
    result: &ModelResult,
    saved_to: Option<&Path>,
    format: &str,
) -> Result<String, ForgeError> {
    if format == "json" {
        let out = json!({
            "asset_url": result.asset_url(),
            "format": result.format(),
            "thumbnail_url": result.thumbnail_url(),
            "saved_to": saved_to.map(|p| p.display().to_string()),
        });
        return serde_json::to_string_pretty(&out)
            .map_err(|e| ForgeError::Config(format!("Failed to encode output: {}", e)));
    }
    let mut output = format!("Model: {}\nFormat: {}\n", result.asset_url(), result.format());
    if let Some(thumbnail) = result.thumbnail_url() {
        output.push_str(&format!("Thumbnail: {}\n", thumbnail));
    }
    if let Some(path) = saved_to {
        output.push_str(&format!("Saved to: {}\n", path.display()));
    }
    Ok(output)
}

pub fn format_batch_summary(jobs: &[BatchJob], outcome: &BatchOutcome) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Batch"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Prompt", "Status", "Error"]);
    for job in jobs {
        let status = match job.status {
            BatchJobStatus::Queued => "queued",
            BatchJobStatus::Running => "running",
            BatchJobStatus::Done => "done",
            BatchJobStatus::Failed => "failed",
            BatchJobStatus::Skipped => "skipped",
        };
        table.add_row(vec![
            (job.index + 1).to_string(),
            job.prompt.clone(),
            status.to_string(),
            job.error.clone().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));
    out.push_str(&format!("Batch {}", outcome));
    if let BatchOutcome::Completed {
        succeeded, failed, ..
    } = outcome
    {
        out.push_str(&format!(" ({} succeeded, {} failed)", succeeded, failed));
    }
    out
}
