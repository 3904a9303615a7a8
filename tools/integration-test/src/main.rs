//! End-to-end check of view provisioning and reporting against a live
//! news database. Requires DATABASE_URL (or the default local `news` DB)
//! with populated `log`, `articles`, and `authors` tables.

use anyhow::Result;
use news_reporter::{
    PostgresStore, ReportCatalog, ReportService, ReporterConfig, RunOutcome, SchemaProvisioner,
    ViewStore,
};
use sqlx::{Connection, PgConnection};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    println!("Starting News Reporter Integration Test");

    let config = ReporterConfig::from_env()?;
    let catalog = ReportCatalog::builtin();
    let store = Arc::new(PostgresStore::new(&config.database));

    // Test 1: drop any existing report views so provisioning starts clean
    println!("Test 1: Dropping existing report views...");
    let mut conn = PgConnection::connect(&config.database.url).await?;
    for view in catalog.views() {
        sqlx::query(&format!("DROP VIEW IF EXISTS {}", view.name)).execute(&mut conn).await?;
    }
    conn.close().await?;
    println!("   Dropped up to {} views", catalog.views().len());

    // Test 2: first run must create all three views and print every report
    println!("Test 2: First run (all views absent)...");
    let service = ReportService::new(catalog, store.clone());
    let outcome = service.run().await?;
    anyhow::ensure!(outcome == RunOutcome::Success, "first run did not succeed");
    for view in catalog.views() {
        anyhow::ensure!(
            store.view_exists(view.name).await?,
            "view {} missing after first run",
            view.name
        );
    }
    println!("   First run provisioned all views and completed");

    // Test 3: second provisioning pass must find every view already present
    println!("Test 3: Second run (idempotency)...");
    let provisioner = SchemaProvisioner::new(catalog, store.clone());
    let results = provisioner.ensure_all().await?;
    for result in &results {
        anyhow::ensure!(
            result.existed && !result.created,
            "view {} was re-created on the second pass",
            result.view_name
        );
    }
    let outcome = service.run().await?;
    anyhow::ensure!(outcome == RunOutcome::Success, "second run did not succeed");
    println!("   Second run re-used every view");

    println!("Integration test passed");
    Ok(())
}
