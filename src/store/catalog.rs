//! Metadata catalog over the `ingested_tables` registry

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use sqlx::Row;
use tracing::{info, warn};

use super::loader::{data_columns, table_exists};
use super::{quote_ident, Store};
use crate::error::{SheetloadError, SheetloadResult};
use crate::types::{Quarter, TableMetadata};

fn table_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9_]{1,55}_q[1-4]_[0-9]{4}$").expect("table name pattern is valid")
    })
}

/// Does `name` follow the `<category>_q<n>_<yyyy>` convention?
pub fn is_dynamic_table_name(name: &str) -> bool {
    table_name_pattern().is_match(name)
}

struct RegistryEntry {
    table_name: String,
    category: String,
    quarter: Quarter,
    year: i32,
    created_at: NaiveDateTime,
    last_ingested_at: NaiveDateTime,
    ingest_count: i64,
}

const REGISTRY_COLUMNS: &str =
    "table_name, category, quarter, year, created_at, last_ingested_at, ingest_count";

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> SheetloadResult<RegistryEntry> {
    let quarter: i64 = row.try_get("quarter")?;
    let table_name: String = row.try_get("table_name")?;
    let quarter = Quarter::from_number(quarter as u32).ok_or_else(|| {
        SheetloadError::NotFound(format!("{} (registry has invalid quarter)", table_name))
    })?;
    Ok(RegistryEntry {
        table_name,
        category: row.try_get("category")?,
        quarter,
        year: row.try_get::<i64, _>("year")? as i32,
        created_at: row.try_get("created_at")?,
        last_ingested_at: row.try_get("last_ingested_at")?,
        ingest_count: row.try_get("ingest_count")?,
    })
}

impl Store {
    /// Whether a table of this name physically exists
    pub async fn table_exists(&self, name: &str) -> SheetloadResult<bool> {
        let mut conn = self.pool().acquire().await?;
        table_exists(&mut conn, name).await
    }

    /// Row count and data columns of a registered dynamic table
    pub async fn get_metadata(&self, name: &str) -> SheetloadResult<TableMetadata> {
        if !is_dynamic_table_name(name) {
            return Err(SheetloadError::NotFound(name.to_string()));
        }

        let row = sqlx::query(&format!(
            "SELECT {} FROM ingested_tables WHERE table_name = ?1",
            REGISTRY_COLUMNS
        ))
        .bind(name)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| SheetloadError::NotFound(name.to_string()))?;

        let entry = entry_from_row(&row)?;
        self.describe(entry)
            .await?
            .ok_or_else(|| SheetloadError::NotFound(name.to_string()))
    }

    /// Every registered table that still exists, by name
    pub async fn list_dynamic_tables(&self) -> SheetloadResult<Vec<TableMetadata>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM ingested_tables ORDER BY table_name",
            REGISTRY_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let entry = entry_from_row(row)?;
            let name = entry.table_name.clone();
            match self.describe(entry).await? {
                Some(metadata) => tables.push(metadata),
                None => warn!(table = %name, "Registered table is missing from the database"),
            }
        }
        Ok(tables)
    }

    /// Drop a dynamic table and its registry entry together
    pub async fn drop_table(&self, name: &str) -> SheetloadResult<()> {
        if !is_dynamic_table_name(name) {
            return Err(SheetloadError::NotFound(name.to_string()));
        }

        let mut tx = self.pool().begin().await?;
        let registered = sqlx::query("DELETE FROM ingested_tables WHERE table_name = ?1")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let existed = table_exists(&mut tx, name).await?;
        if registered == 0 && !existed {
            return Err(SheetloadError::NotFound(name.to_string()));
        }

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(table = name, "Dropped table");
        Ok(())
    }

    /// Data rows of a dynamic table in insertion order, ordered like `metadata.columns`
    pub async fn fetch_rows(
        &self,
        name: &str,
    ) -> SheetloadResult<(TableMetadata, Vec<Vec<Option<String>>>)> {
        let metadata = self.get_metadata(name).await?;
        if metadata.columns.is_empty() {
            return Ok((metadata, Vec::new()));
        }

        let select = metadata
            .columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let rows = sqlx::query(&format!(
            "SELECT {} FROM {} ORDER BY id",
            select,
            quote_ident(name)
        ))
        .fetch_all(self.pool())
        .await?;

        let mut values = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut cells = Vec::with_capacity(metadata.columns.len());
            for index in 0..metadata.columns.len() {
                cells.push(row.try_get::<Option<String>, _>(index)?);
            }
            values.push(cells);
        }
        Ok((metadata, values))
    }

    async fn describe(&self, entry: RegistryEntry) -> SheetloadResult<Option<TableMetadata>> {
        let mut conn = self.pool().acquire().await?;
        if !table_exists(&mut conn, &entry.table_name).await? {
            return Ok(None);
        }

        let columns = data_columns(&mut conn, &entry.table_name).await?;
        let row_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {}",
            quote_ident(&entry.table_name)
        ))
        .fetch_one(&mut *conn)
        .await?;

        Ok(Some(TableMetadata {
            table_name: entry.table_name,
            category: entry.category,
            quarter: entry.quarter,
            year: entry.year,
            row_count: row_count as u64,
            columns,
            created_at: entry.created_at,
            last_ingested_at: entry.last_ingested_at,
            ingest_count: entry.ingest_count,
        }))
    }
}
