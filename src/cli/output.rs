//! CLI output: result tables and settings rendering.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::availability::AvailabilityResult;
use crate::config::{AvailabilitySettings, RequestMonitorSettings};
use crate::error::InsightsError;

/// Render probe results as a table.
pub fn format_probe_results(results: &[AvailabilityResult], color: bool) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Target", "Status", "Duration", "Message"]);

    for result in results {
        let status = match (result.succeeded(), color) {
            (true, true) => "up".green().to_string(),
            (false, true) => "down".red().to_string(),
            (true, false) => "up".to_string(),
            (false, false) => "down".to_string(),
        };
        table.add_row(vec![
            Cell::new(result.name()),
            Cell::new(result.target()),
            Cell::new(status),
            Cell::new(format!("{} ms", result.duration().as_millis())),
            Cell::new(result.message()),
        ]);
    }

    let failed = results.iter().filter(|r| !r.succeeded()).count();
    format!(
        "{}\n{} target(s) probed, {} down",
        table,
        results.len(),
        failed
    )
}

#[derive(Serialize)]
struct SettingsView<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    disabled: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    monitor: Option<&'a RequestMonitorSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    availability: Option<&'a AvailabilitySettings>,
}

/// Render resolved settings as TOML. Keys must already be redacted.
pub fn format_settings(
    monitor: Option<&RequestMonitorSettings>,
    availability: Option<&AvailabilitySettings>,
    disabled: Vec<String>,
) -> Result<String, InsightsError> {
    let view = SettingsView {
        disabled,
        monitor,
        availability,
    };
    toml::to_string_pretty(&view)
        .map_err(|e| InsightsError::Runtime(format!("Failed to render settings: {}", e)))
}

/// Map errors to a string for CLI output.
pub fn map_error(e: &InsightsError) -> String {
    e.to_string()
}
