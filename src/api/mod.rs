//! Sheetload API Server module
//!
//! HTTP REST API for workbook uploads and the table catalog.
//! Run with `sheetload-server`.

pub mod handlers;
pub mod server;

pub use server::{build_router, run_api_server, ApiConfig, AppState};
