//! Command implementations for the sentinel CLI.
//!
//! Each submodule implements the logic for a command group.

pub mod incident;
pub mod repair;
pub mod status;

use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use sentinel_core::{Incident, IncidentStatus};

/// Colored status label.
pub(crate) fn status_label(status: IncidentStatus) -> ColoredString {
    paint_status(status, status.as_str().to_uppercase())
}

/// Color `label` by the status it describes.
pub(crate) fn paint_status(status: IncidentStatus, label: String) -> ColoredString {
    match status {
        IncidentStatus::Pending => label.yellow(),
        IncidentStatus::Analyzing | IncidentStatus::Repairing => label.cyan(),
        IncidentStatus::Resolved => label.green().bold(),
        IncidentStatus::Failed => label.red().bold(),
    }
}

/// Render epoch milliseconds in local time.
pub(crate) fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Full incident view.
pub(crate) fn print_incident(incident: &Incident) {
    println!();
    println!("  {} {}", incident.id.bold(), status_label(incident.status));
    println!("  {}", incident.title);
    println!();
    println!("    {:<12} {}", "Severity:".cyan(), incident.severity);
    println!("    {:<12} {}", "Source:".cyan(), incident.source);
    println!("    {:<12} {}", "Created:".cyan(), format_timestamp(incident.created_at));
    println!("    {:<12} {}", "Updated:".cyan(), format_timestamp(incident.updated_at));
    if let Some(ref execution_id) = incident.workflow_execution_id {
        println!("    {:<12} {}", "Workflow:".cyan(), execution_id);
    }

    println!();
    println!("  {}", "Description:".cyan().bold());
    println!("    {}", incident.description);

    if let Some(ref resolution) = incident.resolution {
        println!();
        println!("  {}", "Resolution:".cyan().bold());
        println!("    {}", resolution);
    }

    if !incident.metadata.is_empty() {
        println!();
        println!("  {}", "Metadata:".cyan().bold());
        for (key, value) in &incident.metadata {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            println!("    {}: {}", key.dimmed(), rendered);
        }
    }
    println!();
}
