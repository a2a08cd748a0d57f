//! CLI argument definitions using clap derive macros.

use clap::{Args, Parser, Subcommand};

/// DevSentinel CLI
///
/// Report incidents to sentinel-server and follow them through triage and repair.
#[derive(Parser, Debug)]
#[command(name = "sentinel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report a new incident and wait for the pipeline to finish
    Report(ReportArgs),

    /// Show a single incident
    Show {
        /// Incident ID
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List incidents, newest first
    List {
        /// Number of incidents to skip
        #[arg(long, default_value_t = 0)]
        skip: u32,

        /// Maximum number of incidents to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: u32,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Trigger a repair for a pending or failed incident
    Repair {
        /// Incident ID
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Delete an incident
    Delete {
        /// Incident ID
        id: String,
    },

    /// Show incident statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show recent server activity
    Activity {
        /// Maximum number of events
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check server health
    Health {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show version
    Version,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Short incident title
    #[arg(short, long)]
    pub title: String,

    /// What is going wrong
    #[arg(short, long)]
    pub description: String,

    /// Severity: low, medium, high or critical
    #[arg(short, long, default_value = "medium")]
    pub severity: String,

    /// Reporting system
    #[arg(long, default_value = "cli")]
    pub source: String,

    /// Extra metadata as key=value (repeatable)
    #[arg(short, long = "meta", value_name = "KEY=VALUE")]
    pub meta: Vec<String>,

    /// Raw error output passed to the repair step
    #[arg(long)]
    pub error_details: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}
