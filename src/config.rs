//! Configuration values passed explicitly to the store and ingestion service.
//!
//! Defaults are overridden by an optional YAML file, which binaries in turn
//! override from flags and environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SheetloadError, SheetloadResult};
use crate::ingest::headers::{normalize_identifier, RESERVED_COLUMNS};
use crate::types::ColumnIdent;

/// Upload acceptance rules for one ingestion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Uploads larger than this are rejected before any processing
    pub max_upload_bytes: u64,
    /// Accepted file extensions, lower-case, without the dot
    pub allowed_extensions: Vec<String>,
    /// Primary business identifier; rows without it are skipped
    pub key_column: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_extensions: vec!["xlsx".to_string()],
            key_column: "dealer".to_string(),
        }
    }
}

/// Datastore connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout_secs: u64,
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://sheetload.db".to_string(),
            max_connections: 5,
            busy_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ingest: IngestConfig,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load from a YAML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> SheetloadResult<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&text)?
            }
            None => AppConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SheetloadResult<()> {
        if self.ingest.max_upload_bytes == 0 {
            return Err(SheetloadError::Config(
                "ingest.max_upload_bytes must be greater than zero".to_string(),
            ));
        }
        if self.ingest.allowed_extensions.is_empty() {
            return Err(SheetloadError::Config(
                "ingest.allowed_extensions must not be empty".to_string(),
            ));
        }
        if self.ingest.key_column.trim().is_empty() {
            return Err(SheetloadError::Config(
                "ingest.key_column must not be empty".to_string(),
            ));
        }
        // rows are matched against sanitized header names
        let key = self.ingest.key_column.as_str();
        if ColumnIdent::parse(key).is_none() || RESERVED_COLUMNS.contains(&key) {
            return Err(SheetloadError::Config(format!(
                "ingest.key_column '{}' is not a sanitized column name (did you mean '{}'?)",
                key,
                normalize_identifier(key)
            )));
        }
        if self.store.max_connections == 0 {
            return Err(SheetloadError::Config(
                "store.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
