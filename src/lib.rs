//! Sheetload - quarterly multi-sheet workbook ingestion
//!
//! Takes an uploaded `.xlsx` workbook whose sheets are regional slices of one
//! quarterly report, checks that every sheet has the same headers, and loads
//! all of them into a single period table (`<category>_q<quarter>_<year>`)
//! inside one transaction.
//!
//! # Pipeline
//!
//! - [`ingest::metadata`] reads category, quarter and year from the file name
//!   and the region from each sheet name
//! - [`ingest::sheet`] turns a sheet into sanitized columns and row records
//! - [`ingest::schema`] enforces one header layout across the workbook
//! - [`store`] creates the table if needed and bulk-inserts every row
//!
//! # Example
//!
//! ```no_run
//! use sheetload::config::AppConfig;
//! use sheetload::ingest::IngestService;
//! use sheetload::store::Store;
//! use std::path::Path;
//!
//! # async fn run() -> sheetload::SheetloadResult<()> {
//! let config = AppConfig::default();
//! let store = Store::connect(&config.store).await?;
//! let service = IngestService::new(store, config.ingest);
//!
//! let result = service.ingest_path(Path::new("Sales_Q1_2025.xlsx")).await?;
//! println!("{} rows loaded", result.total_rows);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod excel;
pub mod ingest;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{SheetloadError, SheetloadResult};
pub use types::{FileInfo, IngestionResult, Quarter, SheetError, SheetInfo, TableMetadata};
