//! Server status commands: stats, activity and health.
//!
//! Supports JSON output for programmatic use.

use anyhow::Result;
use colored::Colorize;

use super::format_timestamp;
use crate::api::ApiClient;
use crate::config::Config;

/// Incident counts by status.
pub async fn stats(json: bool, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let stats = client.stats().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!("  {}", "Incidents".cyan().bold());
    println!("    Total:     {}", stats.total);
    println!("    Active:    {}", stats.active.to_string().yellow());
    println!("    Resolved:  {}", stats.resolved.to_string().green());
    println!("    Failed:    {}", stats.failed.to_string().red());
    println!();
    println!("  {}", "By status".cyan().bold());
    println!("    pending    {}", stats.pending);
    println!("    analyzing  {}", stats.analyzing);
    println!("    repairing  {}", stats.repairing);
    println!();
    println!("  {} {}", "Repair actions:".cyan().bold(), stats.actions);
    println!();
    Ok(())
}

/// Recent server activity, newest first.
pub async fn activity(limit: usize, json: bool, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let events = client.activity(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("No recent activity");
        return Ok(());
    }

    for event in &events {
        let kind = if event.kind.ends_with("failed") {
            event.kind.red()
        } else {
            event.kind.green()
        };
        println!(
            "{}  {:<20} {:<18} {}",
            format_timestamp(event.timestamp).dimmed(),
            kind,
            event.incident_id.as_deref().unwrap_or("-"),
            event.message
        );
    }
    Ok(())
}

/// Server health and component status.
pub async fn health(json: bool, config: &Config) -> Result<()> {
    let client = ApiClient::new(config)?;
    let health = client.health().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    let mark = |ok: bool| if ok { "✓".green() } else { "✗".red() };
    let status = if health.status == "healthy" {
        health.status.to_uppercase().green().bold()
    } else {
        health.status.to_uppercase().yellow().bold()
    };

    println!();
    println!("  {} v{} {}", health.service.bold(), health.version, status);
    println!("    Uptime: {}s", health.uptime_seconds);
    println!(
        "    {} database   {} ai   {} auto-repair",
        mark(health.components.database),
        mark(health.components.ai),
        mark(health.components.auto_repair)
    );
    println!();
    Ok(())
}
