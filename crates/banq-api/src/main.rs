//! XPower Banq API binary.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Parse flags / environment into [`ApiConfig`]
//! 3. Open and probe every `*.db` archive (fatal on any failure)
//! 4. Build the shared state with an empty connection registry
//! 5. Serve until `Ctrl-C` / `SIGTERM`, then close all pools

use std::sync::Arc;

use banq_api::error::AppError;
use banq_api::{start_server, ApiConfig, AppState, Cli};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, database validation or the server
/// fails. The process then exits non-zero without serving traffic.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // 2. Load configuration.
    let config = ApiConfig::try_from(Cli::parse())?;
    info!(
        db_path = %config.db_path.display(),
        max_rows = config.max_rows,
        cors_origins = ?config.cors_origins,
        "XPower Banq API starting"
    );

    // 3. Validate databases before accepting connections.
    let report = banq_db::validate_all(&config.db_path).await?;
    info!(databases = report.checked.len(), "Database validation passed");

    // 4. Assemble shared state.
    let state = Arc::new(AppState::for_storage(config.db_path.clone(), config.max_rows));

    // 5. Serve.
    start_server(&config.server(), state).await?;

    info!("XPower Banq API shutdown complete");
    Ok(())
}
