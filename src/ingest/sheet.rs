//! Sheet processor: one sheet's raw rows → region-tagged row records.
//!
//! Layout: row 1 is a title and ignored, row 2 holds headers, data starts at row 3.

use tracing::debug;

use super::headers::{sanitize_header_row, SanitizedHeader};
use crate::types::{ColumnIdent, RowRecord, UnifiedSchema};

/// Minimum rows for a sheet to carry data: title, header, one data row
pub const MIN_SHEET_ROWS: usize = 3;

/// Column every row is tagged with
pub const REGION_COLUMN: &str = "region";

const HEADER_ROW: usize = 1;
const FIRST_DATA_ROW: usize = 2;

/// A sheet's cells as text, `None` for blank cells, rows anchored at A1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub name: String,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

/// Output of processing one sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedSheet {
    /// Sanitized header row as written; the unifier compares these
    pub header_columns: Vec<ColumnIdent>,
    pub rows: Vec<RowRecord>,
    /// Data rows dropped for a missing key value
    pub skipped: usize,
}

/// Build row records for one sheet.
///
/// Every record's `region` value is the sheet's region, whatever the cell
/// holds. When the header row has no `region` column the value is appended
/// to each record, matching [`with_region_column`]. Rows with a blank
/// `key_column` are dropped and counted in `skipped`.
pub fn process_sheet(rows: &[Vec<Option<String>>], region: &str, key_column: &str) -> ProcessedSheet {
    if rows.len() < MIN_SHEET_ROWS {
        return ProcessedSheet::default();
    }

    let raw_headers: Vec<&str> = rows[HEADER_ROW]
        .iter()
        .map(|cell| cell.as_deref().unwrap_or(""))
        .collect();
    let headers = sanitize_header_row(&raw_headers);
    if headers.is_empty() {
        return ProcessedSheet::default();
    }

    let header_columns: Vec<ColumnIdent> = headers.iter().map(|h| h.ident.clone()).collect();
    let has_region = header_columns.iter().any(|c| c.as_str() == REGION_COLUMN);

    let mut records = Vec::with_capacity(rows.len() - FIRST_DATA_ROW);
    let mut skipped = 0;
    for (offset, row) in rows[FIRST_DATA_ROW..].iter().enumerate() {
        let record = build_record(row, &headers, has_region, region);
        if record.get(key_column).is_none() {
            debug!(
                row = offset + FIRST_DATA_ROW + 1,
                key = key_column,
                "Skipping row without a key value"
            );
            skipped += 1;
            continue;
        }
        records.push(record);
    }

    ProcessedSheet {
        header_columns,
        rows: records,
        skipped,
    }
}

/// Load columns for a unified header schema: `region` is appended when absent
pub fn with_region_column(schema: UnifiedSchema) -> UnifiedSchema {
    if schema.contains(REGION_COLUMN) {
        return schema;
    }
    let mut columns = schema.columns().to_vec();
    columns.push(ColumnIdent::new_unchecked(REGION_COLUMN.to_string()));
    UnifiedSchema::new(columns)
}

fn build_record(
    row: &[Option<String>],
    headers: &[SanitizedHeader],
    has_region: bool,
    region: &str,
) -> RowRecord {
    let mut values: Vec<(ColumnIdent, Option<String>)> = headers
        .iter()
        .map(|header| {
            let value = if header.ident.as_str() == REGION_COLUMN {
                Some(region.to_string())
            } else {
                row.get(header.source_index)
                    .and_then(|cell| cell.as_deref())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            (header.ident.clone(), value)
        })
        .collect();

    if !has_region {
        values.push((
            ColumnIdent::new_unchecked(REGION_COLUMN.to_string()),
            Some(region.to_string()),
        ));
    }

    RowRecord {
        region: region.to_string(),
        values,
    }
}
