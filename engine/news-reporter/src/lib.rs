//! News log analytics reporter
//!
//! This crate provisions the derived report views in the news database and
//! renders the three request-log reports from them: most-viewed articles,
//! most-read authors, and days with anomalous error rates.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod provision;
pub mod report;
pub mod service;
pub mod store;

pub use catalog::{ColumnBinding, ColumnKind, ReportCatalog, ViewDefinition};
pub use config::{DatabaseConfig, ReporterConfig};
pub use error::ReportError;
pub use logging::initialize_logging;
pub use provision::{ProvisioningResult, SchemaProvisioner};
pub use report::{Report, ReportRenderer, ReportRow, ReportValue};
pub use service::{ReportService, RunOutcome};
pub use store::{InMemoryStore, PostgresStore, ViewStore};

/// Result type alias
pub type Result<T> = std::result::Result<T, ReportError>;
