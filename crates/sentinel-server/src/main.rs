//! sentinel-server - DevSentinel backend server
//!
//! HTTP API for incident intake, the triage pipeline and the dashboard.

use anyhow::Context;
use sentinel_core::integrations::{ClineExecutor, GeminiAdvisor, KestraTrigger};
use sentinel_core::Database;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod routes;
mod services;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("sentinel_server=info".parse()?)
                .add_directive("sentinel_core=info".parse()?),
        )
        .init();

    info!("sentinel-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = config::Config::load()?;
    config.ensure_dirs()?;
    info!(
        database = %config.database_path.display(),
        auto_repair = config.sentinel.orchestrator.auto_repair_enabled,
        repair_error_policy = %config.sentinel.orchestrator.repair_error_policy,
        "Config loaded"
    );

    // Open database
    let db = Database::open_path(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path.display()))?;

    // Collaborators
    let advisor = Arc::new(GeminiAdvisor::new(&config.sentinel.gemini)?);
    let workflow = Arc::new(KestraTrigger::new(&config.sentinel.kestra)?);
    let executor = Arc::new(ClineExecutor::new(&config.sentinel.cline));

    let bind = config.bind;
    let state = AppState::new(config, db, advisor, workflow, executor);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("Server listening on http://{}", bind);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Shutting down...");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install TERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal");
}
