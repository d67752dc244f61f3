//! CLI command handlers

pub mod commands;

pub use commands::{describe, drop_table, export, ingest, list};
