//! Configuration for the news reporter

use serde::{Deserialize, Serialize};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Reporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    pub database: DatabaseConfig,
}

/// Connection URL for the fixed `news` database.
const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/news";

impl Default for ReporterConfig {
    fn default() -> Self {
        Self { database: DatabaseConfig { url: DEFAULT_DATABASE_URL.to_string() } }
    }
}

impl ReporterConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, crate::ReportError> {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(crate::ReportError::InvalidConfig {
                message: format!("DATABASE_URL is not a PostgreSQL URL: {url}"),
            });
        }

        Ok(Self { database: DatabaseConfig { url } })
    }
}
