//! News log report runner
//!
//! One-shot entry point: provisions the report views if needed, then prints
//! the three reports. The whole run is synchronous from end to end, so it
//! rides a current-thread runtime.

use anyhow::{Context, Result};
use news_reporter::{
    initialize_logging, PostgresStore, ReportCatalog, ReportService, ReporterConfig, RunOutcome,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging first
    initialize_logging()?;

    info!("Starting news reporter v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ReporterConfig::from_env().context("Failed to load configuration")?;
    info!("Reporting against {}", config.database.url);

    let store = Arc::new(PostgresStore::new(&config.database));
    let service = ReportService::new(ReportCatalog::builtin(), store);

    match service.run().await? {
        RunOutcome::Success => Ok(()),
        RunOutcome::Aborted => std::process::exit(1),
    }
}
