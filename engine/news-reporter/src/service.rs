//! Report run orchestration
//!
//! One run is a two-phase pass: provision all report views, and only if
//! every view is present, render every report. There is no retry loop and
//! no partial-success path.

use crate::catalog::ReportCatalog;
use crate::provision::SchemaProvisioner;
use crate::report::{Report, ReportRenderer};
use crate::store::ViewStore;
use crate::Result;
use std::sync::Arc;
use tracing::warn;

const PROVISIONING_FAILED: &str = "There are problems with the supporting views!";
const COMPLETION_MARKER: &str = "[END]";

/// Terminal state of a report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All views present, all reports printed
    Success,
    /// Provisioning failed; nothing was rendered
    Aborted,
}

/// Sequences view provisioning and report rendering.
pub struct ReportService {
    catalog: ReportCatalog,
    provisioner: SchemaProvisioner,
    renderer: ReportRenderer,
}

impl ReportService {
    pub fn new(catalog: ReportCatalog, store: Arc<dyn ViewStore>) -> Self {
        Self {
            catalog,
            provisioner: SchemaProvisioner::new(catalog, store.clone()),
            renderer: ReportRenderer::new(catalog, store),
        }
    }

    /// Run one full provisioning and reporting pass.
    ///
    /// Fatal database errors (existence checks, report queries) propagate;
    /// creation failures abort the run after a single failure message.
    pub async fn run(&self) -> Result<RunOutcome> {
        let results = self.provisioner.ensure_all().await?;
        if results.iter().any(|result| !result.succeeded) {
            warn!("Aborting report run; provisioning failed");
            println!("{}", PROVISIONING_FAILED);
            return Ok(RunOutcome::Aborted);
        }

        for view in self.catalog.views() {
            let report = self.renderer.render(view.name).await?;
            print_report(&report);
        }

        println!("{}", COMPLETION_MARKER);
        Ok(RunOutcome::Success)
    }
}

fn print_report(report: &Report) {
    println!("{}\n", report.header);
    for line in &report.lines {
        println!("{}", line);
    }
    println!();
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreOp};

    fn op_names(ops: &[StoreOp]) -> Vec<String> {
        ops.iter()
            .map(|op| match op {
                StoreOp::ExistenceCheck(name) => format!("exists:{name}"),
                StoreOp::CreateView(name) => format!("create:{name}"),
                StoreOp::FetchRows(name) => format!("fetch:{name}"),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_first_run_provisions_then_reports_in_fixed_order() {
        let store = Arc::new(InMemoryStore::new());
        let service = ReportService::new(ReportCatalog::builtin(), store.clone());

        let outcome = service.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::Success);

        assert_eq!(
            op_names(&store.operations().await),
            vec![
                "exists:v_top3articles",
                "create:v_top3articles",
                "exists:v_topauthors",
                "create:v_topauthors",
                "exists:v_toperrordays",
                "create:v_toperrordays",
                "fetch:v_top3articles",
                "fetch:v_topauthors",
                "fetch:v_toperrordays",
            ]
        );
    }

    #[tokio::test]
    async fn test_second_run_creates_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let service = ReportService::new(ReportCatalog::builtin(), store.clone());

        service.run().await.unwrap();
        let ops_after_first = store.operations().await.len();

        let outcome = service.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::Success);

        let ops = store.operations().await;
        assert!(ops[ops_after_first..]
            .iter()
            .all(|op| !matches!(op, StoreOp::CreateView(_))));
    }

    #[tokio::test]
    async fn test_provisioning_failure_aborts_before_any_rendering() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_creation_of("v_topauthors").await;
        let service = ReportService::new(ReportCatalog::builtin(), store.clone());

        let outcome = service.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::Aborted);

        let ops = store.operations().await;
        assert!(ops.iter().all(|op| !matches!(op, StoreOp::FetchRows(_))));
        // All three views were still checked before the abort.
        assert_eq!(
            ops.iter().filter(|op| matches!(op, StoreOp::ExistenceCheck(_))).count(),
            3
        );
    }
}
