//! Incident commands: report, show, list, delete.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use sentinel_core::types::{Metadata, ERROR_DETAILS_KEY};
use sentinel_core::{IncidentRequest, IncidentSeverity, IncidentStatus};
use serde_json::Value;

use super::{format_timestamp, paint_status, print_incident, status_label};
use crate::api::ApiClient;
use crate::cli::ReportArgs;
use crate::config::Config;

/// Report an incident and print where the pipeline left it.
pub async fn report(args: ReportArgs, config: &Config) -> Result<()> {
    let severity: IncidentSeverity = args.severity.parse()?;

    let mut metadata = parse_meta(&args.meta)?;
    if let Some(details) = args.error_details {
        metadata.insert(ERROR_DETAILS_KEY.to_string(), Value::String(details));
    }

    let request = IncidentRequest {
        title: args.title,
        description: args.description,
        severity,
        source: args.source,
        metadata: (!metadata.is_empty()).then_some(metadata),
    };
    request.validate()?;

    let client = ApiClient::new(config)?;
    if !args.json {
        println!("{} Reporting incident \"{}\"...", "→".cyan(), request.title);
    }
    let incident = client.report(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&incident)?);
        return Ok(());
    }

    print_incident(&incident);
    if incident.status == IncidentStatus::Pending {
        println!("  Repair with: sentinel repair {}", incident.id);
        println!();
    }
    Ok(())
}

pub async fn show(id: &str, json: bool, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let incident = client.get_incident(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&incident)?);
    } else {
        print_incident(&incident);
    }
    Ok(())
}

pub async fn list(skip: u32, limit: u32, json: bool, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let incidents = client.list_incidents(skip, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&incidents)?);
        return Ok(());
    }

    if incidents.is_empty() {
        println!("No incidents");
        return Ok(());
    }

    println!(
        "{:<18} {:<10} {:<9} {:<20} {}",
        "ID".bold(),
        "STATUS".bold(),
        "SEVERITY".bold(),
        "CREATED".bold(),
        "TITLE".bold()
    );
    for incident in &incidents {
        // Pad before painting so escape codes do not skew the columns
        let status = paint_status(
            incident.status,
            format!("{:<10}", incident.status.as_str().to_uppercase()),
        );
        println!(
            "{:<18} {} {:<9} {:<20} {}",
            incident.id,
            status,
            incident.severity,
            format_timestamp(incident.created_at),
            incident.title
        );
    }
    Ok(())
}

pub async fn delete(id: &str, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let incident = client.get_incident(id).await?;
    client.delete_incident(id).await?;

    println!(
        "{} Deleted {} ({})",
        "✓".green(),
        incident.id,
        status_label(incident.status)
    );
    Ok(())
}

/// Parse repeated `key=value` options into incident metadata.
///
/// Values that parse as JSON keep their type; anything else is stored as a string.
fn parse_meta(pairs: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .with_context(|| format!("Invalid metadata '{}', expected KEY=VALUE", pair))?;
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid metadata '{}', key is empty", pair);
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        metadata.insert(key.to_string(), value);
    }
    Ok(metadata)
}
