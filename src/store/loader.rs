//! Table materializer + bulk loader.
//!
//! Table creation, row insertion and the registry update share one
//! transaction. Any error returns before `commit`, and dropping the
//! transaction rolls everything back.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

use super::{quote_ident, Store};
use crate::error::{SheetloadError, SheetloadResult};
use crate::types::{FileInfo, RowRecord, UnifiedSchema};

/// Bind parameters allowed in one statement (SQLite's compiled-in maximum is 32766)
pub const INSERT_BIND_LIMIT: usize = 32_000;

/// Everything one ingestion writes
#[derive(Debug, Clone, Copy)]
pub struct LoadPlan<'a> {
    pub file: &'a FileInfo,
    pub source_file: &'a str,
    pub schema: &'a UnifiedSchema,
    pub rows: &'a [RowRecord],
    pub key_column: &'a str,
}

/// What a committed load did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOutcome {
    pub created: bool,
    pub rows_inserted: u64,
}

impl Store {
    /// Create the destination table if needed and insert every row, atomically
    pub async fn materialize_and_load(&self, plan: &LoadPlan<'_>) -> SheetloadResult<LoadOutcome> {
        let table = plan.file.table_name.as_str();
        let mut tx = self.pool().begin().await?;

        let created = ensure_table(&mut tx, table, plan.schema, plan.key_column).await?;
        let rows_inserted = insert_rows(&mut tx, table, plan.schema, plan.rows).await?;
        register_table(&mut tx, plan.file, plan.source_file).await?;

        tx.commit().await?;
        info!(table, created, rows = rows_inserted, "Committed ingestion");
        Ok(LoadOutcome {
            created,
            rows_inserted,
        })
    }
}

pub(crate) async fn table_exists(conn: &mut SqliteConnection, table: &str) -> SheetloadResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Data columns of an existing table, in table order
pub(crate) async fn data_columns(conn: &mut SqliteConnection, table: &str) -> SheetloadResult<Vec<String>> {
    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .bind(table)
            .fetch_all(&mut *conn)
            .await?;
    Ok(columns
        .into_iter()
        .filter(|c| c != "id" && c != "created_at")
        .collect())
}

/// Create the table unless it exists. Returns whether it was created.
///
/// An existing table must already have exactly the schema's columns.
pub(crate) async fn ensure_table(
    conn: &mut SqliteConnection,
    table: &str,
    schema: &UnifiedSchema,
    key_column: &str,
) -> SheetloadResult<bool> {
    if table_exists(conn, table).await? {
        let existing = data_columns(conn, table).await?;
        if existing != schema.names() {
            return Err(SheetloadError::ExistingTableMismatch {
                table: table.to_string(),
                detail: format!(
                    "table has columns [{}], workbook has [{}]",
                    existing.join(", "),
                    schema.names().join(", ")
                ),
            });
        }
        info!(table, "Table already exists, appending rows");
        return Ok(false);
    }

    let ddl = create_table_sql(table, schema, key_column);
    debug!(table, %ddl, "Creating table");
    sqlx::query(&ddl).execute(&mut *conn).await?;
    Ok(true)
}

fn create_table_sql(table: &str, schema: &UnifiedSchema, key_column: &str) -> String {
    let mut columns = vec!["id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];
    for column in schema.columns() {
        let constraint = if column.as_str() == key_column {
            " NOT NULL"
        } else {
            ""
        };
        columns.push(format!("{} TEXT{}", quote_ident(column.as_str()), constraint));
    }
    columns.push("created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote_ident(table),
        columns.join(",\n    ")
    )
}

/// Multi-row parameterized inserts, split only when the bind limit demands it
pub(crate) async fn insert_rows(
    conn: &mut SqliteConnection,
    table: &str,
    schema: &UnifiedSchema,
    rows: &[RowRecord],
) -> SheetloadResult<u64> {
    if rows.is_empty() || schema.is_empty() {
        return Ok(0);
    }
    debug_assert!(rows.iter().all(|row| row.values.len() == schema.len()));

    let column_list = schema
        .columns()
        .iter()
        .map(|c| quote_ident(c.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let rows_per_statement = (INSERT_BIND_LIMIT / schema.len()).max(1);

    let mut inserted = 0;
    for chunk in rows.chunks(rows_per_statement) {
        let mut qb: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("INSERT INTO {} ({}) ", quote_ident(table), column_list));
        qb.push_values(chunk, |mut b, row| {
            for (_, value) in &row.values {
                b.push_bind(value.clone());
            }
        });
        inserted += qb.build().execute(&mut *conn).await?.rows_affected();
    }
    Ok(inserted)
}

async fn register_table(
    conn: &mut SqliteConnection,
    file: &FileInfo,
    source_file: &str,
) -> SheetloadResult<()> {
    sqlx::query(
        r#"
        INSERT INTO ingested_tables (table_name, category, quarter, year, source_file)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (table_name) DO UPDATE SET
            last_ingested_at = CURRENT_TIMESTAMP,
            source_file = excluded.source_file,
            ingest_count = ingested_tables.ingest_count + 1
        "#,
    )
    .bind(&file.table_name)
    .bind(&file.category)
    .bind(file.quarter.number() as i64)
    .bind(file.year as i64)
    .bind(source_file)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
