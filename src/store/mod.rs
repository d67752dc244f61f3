//! Datastore access: connection pool, table materializer + bulk loader, catalog.
//!
//! Dynamic tables are registered in `ingested_tables` when they are created,
//! and the catalog reads that registry instead of pattern-matching the
//! database's own table list.

mod catalog;
mod loader;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::SheetloadResult;

pub use catalog::is_dynamic_table_name;
pub use loader::{LoadOutcome, LoadPlan, INSERT_BIND_LIMIT};

/// Registry of every table created by ingestion
pub const REGISTRY_TABLE: &str = "ingested_tables";

const REGISTRY_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS ingested_tables (
    table_name TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    quarter INTEGER NOT NULL CHECK (quarter BETWEEN 1 AND 4),
    year INTEGER NOT NULL,
    source_file TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    last_ingested_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    ingest_count INTEGER NOT NULL DEFAULT 1,
    UNIQUE (category, quarter, year)
)
"#;

#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the pool described by `config` and make sure the registry exists
    pub async fn connect(config: &StoreConfig) -> SheetloadResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout());

        // every connection to an in-memory URL is its own database
        let in_memory = config.database_url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { config.max_connections };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool };
        store.bootstrap().await?;
        debug!(url = %config.database_url, max_connections, "Datastore ready");
        Ok(store)
    }

    async fn bootstrap(&self) -> SheetloadResult<()> {
        sqlx::query(REGISTRY_SQL).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Double-quote an identifier that has already been sanitized
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
