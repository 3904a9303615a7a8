//! Idempotent provisioning of the report views
//!
//! Each report view is checked against the schema metadata and created from
//! its catalog definition when missing. Creation failures are reported and
//! recovered at the caller; existence-check failures propagate.

use crate::catalog::ReportCatalog;
use crate::store::ViewStore;
use crate::Result;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of a single provisioning attempt. Transient; references the
/// catalog view by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningResult {
    pub view_name: String,
    /// The view was already present; nothing was executed
    pub existed: bool,
    /// The view was created by this attempt
    pub created: bool,
    /// The view is present after this attempt
    pub succeeded: bool,
}

/// Checks catalog views for existence and creates the missing ones.
pub struct SchemaProvisioner {
    catalog: ReportCatalog,
    store: Arc<dyn ViewStore>,
}

impl SchemaProvisioner {
    pub fn new(catalog: ReportCatalog, store: Arc<dyn ViewStore>) -> Self {
        Self { catalog, store }
    }

    /// Ensure the named catalog view exists, creating it if missing.
    ///
    /// A failed creation is caught, reported with the view name and the
    /// underlying error, and returned as an unsuccessful result. A failed
    /// existence check propagates.
    ///
    /// Panics if `name` is not in the catalog.
    pub async fn ensure_view(&self, name: &str) -> Result<ProvisioningResult> {
        let view = self.catalog.expect_view(name);

        if self.store.view_exists(view.name).await? {
            info!("View '{}' exists", view.name);
            return Ok(ProvisioningResult {
                view_name: view.name.to_string(),
                existed: true,
                created: false,
                succeeded: true,
            });
        }

        println!("- View '{}' does NOT exist! Creating it...", view.name);

        match self.store.create_view(view).await {
            Ok(()) => {
                info!("View '{}' created", view.name);
                Ok(ProvisioningResult {
                    view_name: view.name.to_string(),
                    existed: false,
                    created: true,
                    succeeded: true,
                })
            }
            Err(e) => {
                println!("- Unable to create view {}!", view.name);
                error!("Failed to create view '{}': {}", view.name, e);
                Ok(ProvisioningResult {
                    view_name: view.name.to_string(),
                    existed: false,
                    created: false,
                    succeeded: false,
                })
            }
        }
    }

    /// Provision every catalog view, in catalog order.
    ///
    /// Views are checked independently: a creation failure on an early view
    /// does not skip the later ones, so the returned results carry the full
    /// set of failures for the caller to report.
    pub async fn ensure_all(&self) -> Result<Vec<ProvisioningResult>> {
        info!("Checking for supporting views...");

        let mut results = Vec::with_capacity(self.catalog.views().len());
        for view in self.catalog.views() {
            results.push(self.ensure_view(view.name).await?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, StoreOp};

    fn new_provisioner(store: &Arc<InMemoryStore>) -> SchemaProvisioner {
        SchemaProvisioner::new(ReportCatalog::builtin(), store.clone())
    }

    #[tokio::test]
    async fn test_existing_view_is_never_recreated() {
        let store = Arc::new(InMemoryStore::new());
        store.seed_view("v_top3articles", Vec::new()).await;
        let provisioner = new_provisioner(&store);

        for _ in 0..2 {
            let result = provisioner.ensure_view("v_top3articles").await.unwrap();
            assert!(result.existed);
            assert!(!result.created);
            assert!(result.succeeded);
        }

        let ops = store.operations().await;
        assert!(!ops.contains(&StoreOp::CreateView("v_top3articles".to_string())));
    }

    #[tokio::test]
    async fn test_missing_view_is_created() {
        let store = Arc::new(InMemoryStore::new());
        let provisioner = new_provisioner(&store);

        let result = provisioner.ensure_view("v_topauthors").await.unwrap();

        assert!(!result.existed);
        assert!(result.created);
        assert!(result.succeeded);
        assert!(store.contains_view("v_topauthors").await);
    }

    #[tokio::test]
    async fn test_failed_creation_is_recovered_and_leaves_nothing() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_creation_of("v_toperrordays").await;
        let provisioner = new_provisioner(&store);

        let result = provisioner.ensure_view("v_toperrordays").await.unwrap();

        assert!(!result.succeeded);
        assert!(!result.created);
        assert!(!store.contains_view("v_toperrordays").await);
    }

    #[tokio::test]
    async fn test_ensure_all_provisions_in_catalog_order() {
        let store = Arc::new(InMemoryStore::new());
        let provisioner = new_provisioner(&store);

        let results = provisioner.ensure_all().await.unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.view_name.as_str()).collect();
        assert_eq!(names, vec!["v_top3articles", "v_topauthors", "v_toperrordays"]);
        assert!(results.iter().all(|r| r.succeeded && r.created));
    }

    #[tokio::test]
    async fn test_ensure_all_checks_every_view_despite_early_failure() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_creation_of("v_top3articles").await;
        let provisioner = new_provisioner(&store);

        let results = provisioner.ensure_all().await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(!results[0].succeeded);
        assert!(results[1].succeeded);
        assert!(results[2].succeeded);

        // The later views were still checked and created.
        let ops = store.operations().await;
        assert!(ops.contains(&StoreOp::ExistenceCheck("v_topauthors".to_string())));
        assert!(ops.contains(&StoreOp::ExistenceCheck("v_toperrordays".to_string())));
        assert!(store.contains_view("v_topauthors").await);
        assert!(store.contains_view("v_toperrordays").await);
    }

    #[tokio::test]
    #[should_panic(expected = "not in the report catalog")]
    async fn test_unknown_view_name_is_a_programming_error() {
        let store = Arc::new(InMemoryStore::new());
        let provisioner = new_provisioner(&store);
        let _ = provisioner.ensure_view("v_unknown").await;
    }
}
