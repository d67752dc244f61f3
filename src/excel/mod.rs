//! Excel reading and writing
//!
//! - Import: uploaded .xlsx → raw text sheets for the ingestion pipeline
//! - Export: a materialized table → .xlsx in the same sheet layout

mod exporter;
mod workbook;

pub use exporter::TableExporter;
pub use workbook::{cell_text, read_workbook};
