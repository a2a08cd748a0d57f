//! Manual repair trigger.

use anyhow::Result;
use colored::Colorize;
use sentinel_core::IncidentStatus;

use super::print_incident;
use crate::api::ApiClient;
use crate::config::Config;

/// Trigger a repair and wait for the outcome.
pub async fn execute(id: &str, json: bool, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;

    if !json {
        println!("{} Repairing {}...", "→".cyan(), id);
    }
    let response = client.trigger_repair(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    let incident = &response.incident;
    match incident.status {
        IncidentStatus::Resolved => println!("{} Repair succeeded", "✓".green()),
        IncidentStatus::Repairing => {
            println!("{} Repair is still in progress", "⚠".yellow())
        }
        _ => println!("{} Repair did not resolve the incident", "✗".red()),
    }
    print_incident(incident);
    Ok(())
}
