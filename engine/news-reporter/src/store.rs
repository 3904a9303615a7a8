//! View store trait and implementations
//!
//! The database is an external collaborator; this seam covers the three
//! operations the reporter needs from it: schema-metadata existence checks,
//! view creation, and row fetches.

use crate::catalog::{ColumnKind, ViewDefinition};
use crate::report::{ReportRow, ReportValue};
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection, Row};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Existence check against the schema metadata. The name is a bound
/// parameter; no caller-supplied text ever reaches statement construction.
const VIEW_EXISTS_QUERY: &str =
    "SELECT table_name FROM information_schema.views WHERE table_name = $1";

/// Abstract store for report view operations
#[async_trait::async_trait]
pub trait ViewStore: Send + Sync {
    /// Check the schema metadata for a view with the given name
    async fn view_exists(&self, name: &str) -> Result<bool>;

    /// Execute the view's creation statement and commit it
    async fn create_view(&self, view: &ViewDefinition) -> Result<()>;

    /// Fetch every row of the view, decoded per its column bindings
    async fn fetch_rows(&self, view: &ViewDefinition) -> Result<Vec<ReportRow>>;
}

/// PostgreSQL-backed view store
///
/// Every call acquires a fresh connection and releases it before returning.
/// The workload is a one-shot report run, so there is no pool and no state
/// carried between calls.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    database_url: String,
}

impl PostgresStore {
    pub fn new(config: &crate::config::DatabaseConfig) -> Self {
        Self { database_url: config.url.clone() }
    }

    async fn connect(&self) -> Result<PgConnection> {
        Ok(PgConnection::connect(&self.database_url).await?)
    }
}

#[async_trait::async_trait]
impl ViewStore for PostgresStore {
    async fn view_exists(&self, name: &str) -> Result<bool> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(VIEW_EXISTS_QUERY).bind(name).fetch_optional(&mut conn).await?;
        conn.close().await?;
        Ok(row.is_some())
    }

    async fn create_view(&self, view: &ViewDefinition) -> Result<()> {
        let mut conn = self.connect().await?;
        let mut tx = conn.begin().await?;
        sqlx::query(view.create_statement).execute(&mut *tx).await?;
        tx.commit().await?;
        conn.close().await?;
        Ok(())
    }

    async fn fetch_rows(&self, view: &ViewDefinition) -> Result<Vec<ReportRow>> {
        let mut conn = self.connect().await?;
        // The name comes from the closed catalog, never from external input.
        let query = format!("SELECT * FROM {}", view.name);
        let rows = sqlx::query(&query).fetch_all(&mut conn).await?;
        conn.close().await?;

        let mut report_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut report_row = ReportRow::new();
            for binding in view.columns {
                let value = match binding.kind {
                    ColumnKind::Text => {
                        let text: String = row.try_get(binding.column)?;
                        ReportValue::Text(text)
                    }
                    ColumnKind::Count => {
                        let count: i64 = row.try_get(binding.column)?;
                        ReportValue::Count(count)
                    }
                    ColumnKind::Rate => {
                        let rate: f64 = row.try_get(binding.column)?;
                        ReportValue::Rate(rate)
                    }
                    ColumnKind::Day => {
                        let day: DateTime<Utc> = row.try_get(binding.column)?;
                        ReportValue::Day(day)
                    }
                };
                report_row.push(binding.column, value);
            }
            report_rows.push(report_row);
        }

        Ok(report_rows)
    }
}

/// A store operation observed by [`InMemoryStore`], for asserting
/// invocation and ordering in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    ExistenceCheck(String),
    CreateView(String),
    FetchRows(String),
}

/// In-memory view store (for testing)
pub struct InMemoryStore {
    views: Arc<Mutex<HashMap<String, Vec<ReportRow>>>>,
    failing_creations: Arc<Mutex<HashSet<String>>>,
    operations: Arc<Mutex<Vec<StoreOp>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            views: Arc::new(Mutex::new(HashMap::new())),
            failing_creations: Arc::new(Mutex::new(HashSet::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make a view present, with the rows its query will return.
    pub async fn seed_view(&self, name: &str, rows: Vec<ReportRow>) {
        self.views.lock().await.insert(name.to_string(), rows);
    }

    /// Make every creation attempt for the named view fail.
    pub async fn fail_creation_of(&self, name: &str) {
        self.failing_creations.lock().await.insert(name.to_string());
    }

    pub async fn contains_view(&self, name: &str) -> bool {
        self.views.lock().await.contains_key(name)
    }

    /// Every operation performed against the store, in call order.
    pub async fn operations(&self) -> Vec<StoreOp> {
        self.operations.lock().await.clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ViewStore for InMemoryStore {
    async fn view_exists(&self, name: &str) -> Result<bool> {
        self.operations.lock().await.push(StoreOp::ExistenceCheck(name.to_string()));
        Ok(self.views.lock().await.contains_key(name))
    }

    async fn create_view(&self, view: &ViewDefinition) -> Result<()> {
        self.operations.lock().await.push(StoreOp::CreateView(view.name.to_string()));

        if self.failing_creations.lock().await.contains(view.name) {
            return Err(sqlx::Error::Protocol(format!(
                "simulated creation failure for {}",
                view.name
            ))
            .into());
        }

        self.views.lock().await.insert(view.name.to_string(), Vec::new());
        Ok(())
    }

    async fn fetch_rows(&self, view: &ViewDefinition) -> Result<Vec<ReportRow>> {
        self.operations.lock().await.push(StoreOp::FetchRows(view.name.to_string()));

        match self.views.lock().await.get(view.name) {
            Some(rows) => Ok(rows.clone()),
            None => Err(sqlx::Error::Protocol(format!(
                "relation \"{}\" does not exist",
                view.name
            ))
            .into()),
        }
    }
}
