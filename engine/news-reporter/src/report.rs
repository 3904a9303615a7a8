//! Report rendering
//!
//! Turns the rows of a report view into the fixed textual report format
//! from the catalog. All aggregation and ordering happens in the view SQL;
//! the renderer only binds columns by name and fills the row template.

use crate::catalog::{ReportCatalog, ViewDefinition};
use crate::store::ViewStore;
use crate::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A scalar value read from a report view column.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Text(String),
    Count(i64),
    Rate(f64),
    Day(DateTime<Utc>),
}

impl ReportValue {
    /// Render the value the way the report templates expect it.
    pub fn render(&self) -> String {
        match self {
            ReportValue::Text(text) => text.clone(),
            ReportValue::Count(count) => count.to_string(),
            ReportValue::Rate(rate) => format!("{rate:.1}"),
            ReportValue::Day(day) => day.format("%B %d, %Y").to_string(),
        }
    }
}

/// One row returned by a report view: an ordered mapping from column name
/// to value. Built per query, discarded after rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportRow {
    columns: Vec<(String, ReportValue)>,
}

impl ReportRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: ReportValue) {
        self.columns.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&ReportValue> {
        self.columns.iter().find(|(name, _)| name == column).map(|(_, value)| value)
    }
}

/// A rendered report: the header line plus one formatted line per view row.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub header: String,
    pub lines: Vec<String>,
}

/// Renders the catalog views into their report formats.
pub struct ReportRenderer {
    catalog: ReportCatalog,
    store: Arc<dyn ViewStore>,
}

impl ReportRenderer {
    pub fn new(catalog: ReportCatalog, store: Arc<dyn ViewStore>) -> Self {
        Self { catalog, store }
    }

    /// Query the named catalog view and format every returned row.
    ///
    /// Row order is exactly the order the view returned; the view's own
    /// ordering clause is authoritative and nothing is re-sorted here.
    /// The view is expected to exist already (provisioning runs first);
    /// querying a missing view surfaces as a database error.
    ///
    /// Panics if `name` is not in the catalog.
    pub async fn render(&self, name: &str) -> Result<Report> {
        let view = self.catalog.expect_view(name);
        let rows = self.store.fetch_rows(view).await?;
        let lines = rows.iter().map(|row| render_row(view, row)).collect();
        Ok(Report { header: view.report_header.to_string(), lines })
    }
}

/// Fill the view's row template from a single row, binding by column name.
///
/// Panics if the row is missing a bound column; rows are decoded from the
/// bindings themselves, so a miss is a programming error.
pub fn render_row(view: &ViewDefinition, row: &ReportRow) -> String {
    let mut line = view.row_template.to_string();
    for binding in view.columns {
        let value = row.get(binding.column).unwrap_or_else(|| {
            panic!("row from view '{}' is missing column '{}'", view.name, binding.column)
        });
        line = line.replace(binding.placeholder, &value.render());
    }
    line
}
