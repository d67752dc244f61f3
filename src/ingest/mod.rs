//! Workbook ingestion pipeline.
//!
//! Metadata parser (file then sheet) → sheet processor → schema unifier →
//! one transactional load through [`crate::store`].

pub mod headers;
pub mod metadata;
pub mod schema;
pub mod service;
pub mod sheet;

pub use headers::{sanitize_header_row, sanitize_headers, SanitizedHeader};
pub use metadata::{extract_region, parse_file_name, parse_file_name_on, parse_sheet_info};
pub use schema::SchemaUnifier;
pub use service::{stage_workbook, IngestService, StagedWorkbook};
pub use sheet::{process_sheet, with_region_column, ProcessedSheet, RawSheet, MIN_SHEET_ROWS, REGION_COLUMN};
