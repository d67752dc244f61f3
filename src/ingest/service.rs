//! Ingestion orchestration: parse → per-sheet loop → unify → one transactional load.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{error, info, warn};

use super::metadata::{parse_file_name, parse_sheet_info};
use super::schema::SchemaUnifier;
use super::sheet::{process_sheet, with_region_column, RawSheet};
use crate::config::IngestConfig;
use crate::error::{SheetloadError, SheetloadResult};
use crate::excel::read_workbook;
use crate::store::{LoadPlan, Store};
use crate::types::{
    FileInfo, IngestionResult, RowRecord, SheetError, SheetInfo, TableSummary, UnifiedSchema,
};

/// Every sheet of a workbook, processed and unified but not yet loaded
#[derive(Debug, Default)]
pub struct StagedWorkbook {
    pub schema: Option<UnifiedSchema>,
    pub rows: Vec<RowRecord>,
    pub sheets: Vec<SheetInfo>,
    pub errors: Vec<SheetError>,
    pub skipped_rows: usize,
}

impl StagedWorkbook {
    pub fn is_loadable(&self) -> bool {
        self.errors.is_empty() && self.schema.is_some()
    }
}

/// Run the metadata parser, sheet processor and schema unifier over every sheet.
///
/// Sheets are handled in workbook order. All sheets are examined even after
/// a failure so every offending sheet is reported; a staged workbook with
/// any error must not be loaded.
pub fn stage_workbook(file: &FileInfo, sheets: &[RawSheet], key_column: &str) -> StagedWorkbook {
    let mut staged = StagedWorkbook::default();
    let mut unifier = SchemaUnifier::new();

    for sheet in sheets {
        let info = match parse_sheet_info(file, &sheet.name) {
            Ok(info) => info,
            Err(e) => {
                warn!(sheet = %sheet.name, error = %e, "Rejecting sheet");
                staged.errors.push(SheetError::sheet(&sheet.name, e.to_string()));
                continue;
            }
        };

        let processed = process_sheet(&sheet.rows, &info.region, key_column);
        if processed.header_columns.is_empty() {
            warn!(sheet = %sheet.name, "Sheet has no header and data rows, skipping");
            continue;
        }

        if let Err(e) = unifier.unify(&sheet.name, &processed.header_columns) {
            warn!(sheet = %sheet.name, error = %e, "Schema mismatch");
            staged.errors.push(SheetError::sheet(&sheet.name, e.to_string()));
            continue;
        }

        info!(
            sheet = %sheet.name,
            region = %info.region,
            rows = processed.rows.len(),
            skipped = processed.skipped,
            "Processed sheet"
        );
        staged.skipped_rows += processed.skipped;
        staged.rows.extend(processed.rows);
        staged.sheets.push(info);
    }

    staged.schema = unifier.into_schema().map(with_region_column);
    if staged.schema.is_none() && staged.errors.is_empty() {
        staged
            .errors
            .push(SheetError::workbook("workbook contains no data sheets"));
    }
    staged
}

/// Per-period async locks so two uploads for one table never interleave
#[derive(Debug, Default)]
struct PeriodLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl PeriodLocks {
    fn for_table(&self, table: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(table.to_string()).or_default().clone()
    }

    /// Give back a lock from `for_table`; the entry goes once nobody else holds it
    fn release(&self, table: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if locks.get(table).is_some_and(|entry| Arc::strong_count(entry) == 1) {
            locks.remove(table);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

/// Ingestion entry point shared by the CLI and the HTTP API
#[derive(Debug)]
pub struct IngestService {
    store: Store,
    config: IngestConfig,
    locks: PeriodLocks,
}

impl IngestService {
    pub fn new(store: Store, config: IngestConfig) -> Self {
        Self {
            store,
            config,
            locks: PeriodLocks::default(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Size first, then extension. Nothing is read or opened before this passes.
    pub fn check_upload(&self, file_name: &str, size: u64) -> SheetloadResult<()> {
        if size > self.config.max_upload_bytes {
            return Err(SheetloadError::FileTooLarge {
                size,
                max: self.config.max_upload_bytes,
            });
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.config.allowed_extensions.iter().any(|a| a == &extension) {
            return Err(SheetloadError::FileFormat(format!(
                "'{}' is not one of: {}",
                file_name,
                self.config.allowed_extensions.join(", ")
            )));
        }
        Ok(())
    }

    /// Ingest a workbook from disk
    pub async fn ingest_path(&self, path: &Path) -> SheetloadResult<IngestionResult> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let size = tokio::fs::metadata(path).await?.len();
        self.check_upload(&file_name, size)?;

        let bytes = tokio::fs::read(path).await?;
        self.ingest_bytes(&file_name, bytes).await
    }

    /// Ingest an uploaded workbook.
    ///
    /// `Err` means the upload was rejected before processing. Every other
    /// outcome, including rollback, is an `IngestionResult`.
    pub async fn ingest_bytes(&self, file_name: &str, bytes: Vec<u8>) -> SheetloadResult<IngestionResult> {
        let started = Instant::now();
        self.check_upload(file_name, bytes.len() as u64)?;

        let file = parse_file_name(file_name);
        info!(
            file = file_name,
            table = %file.table_name,
            quarter = %file.quarter,
            year = file.year,
            "Starting ingestion"
        );

        let sheets = tokio::task::spawn_blocking(move || read_workbook(bytes))
            .await
            .map_err(|e| SheetloadError::Task(e.to_string()))??;

        let staged = stage_workbook(&file, &sheets, &self.config.key_column);
        if !staged.is_loadable() {
            warn!(
                file = file_name,
                errors = staged.errors.len(),
                "Ingestion aborted, nothing loaded"
            );
            return Ok(IngestionResult::failed(staged.errors, started.elapsed()));
        }
        let Some(schema) = staged.schema.as_ref() else {
            return Ok(IngestionResult::failed(staged.errors, started.elapsed()));
        };

        let plan = LoadPlan {
            file: &file,
            source_file: file_name,
            schema,
            rows: &staged.rows,
            key_column: &self.config.key_column,
        };
        let lock = self.locks.for_table(&file.table_name);
        let guard = lock.lock().await;
        let loaded = self.store.materialize_and_load(&plan).await;
        drop(guard);
        self.locks.release(&file.table_name, lock);

        match loaded {
            Ok(outcome) => {
                info!(
                    file = file_name,
                    table = %file.table_name,
                    rows = outcome.rows_inserted,
                    skipped = staged.skipped_rows,
                    "Ingestion complete"
                );
                Ok(IngestionResult {
                    success: true,
                    tables_created: vec![TableSummary {
                        table_name: file.table_name.clone(),
                        rows_count: outcome.rows_inserted,
                        columns: schema.names(),
                    }],
                    errors: Vec::new(),
                    total_rows: outcome.rows_inserted,
                    processing_time: started.elapsed(),
                })
            }
            Err(e) => {
                error!(file = file_name, table = %file.table_name, error = %e, "Load rolled back");
                Ok(IngestionResult::failed(
                    vec![SheetError::workbook(e.to_string())],
                    started.elapsed(),
                ))
            }
        }
    }
}
