//! Provider list presentation: text/json.

use crate::cli::presentation::shared::{format_section_heading, yes_no};
use crate::orchestrator::ProviderStatus;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

pub fn format_provider_list_text(statuses: &[ProviderStatus]) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Providers"));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["", "Provider", "Id", "Configured"]);
    for status in statuses {
        table.add_row(vec![
            if status.active { "*" } else { "" }.to_string(),
            status.provider.display_name().to_string(),
            status.provider.as_str().to_string(),
            yes_no(status.configured).to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    if !statuses.iter().any(|s| s.configured) {
        out.push_str("\nNo API keys configured. Use 'meshforge configure --provider <name>'.\n");
    }
    out
}

pub fn format_provider_list_json(statuses: &[ProviderStatus]) -> String {
    let providers: Vec<_> = statuses
        .iter()
        .map(|status| {
            json!({
                "id": status.provider,
                "name": status.provider.display_name(),
                "configured": status.configured,
                "active": status.active,
            })
        })
        .collect();
    let out = json!({ "providers": providers, "total": statuses.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
