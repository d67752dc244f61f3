#![allow(dead_code)]

use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use sheetload::config::{IngestConfig, StoreConfig};
use sheetload::ingest::IngestService;
use sheetload::store::Store;
use tempfile::{tempdir, TempDir};

/// One worksheet in the ingestion layout: title row, header row, data rows.
/// Empty strings are left as blank cells.
pub struct SheetFixture<'a> {
    pub name: &'a str,
    pub headers: &'a [&'a str],
    pub rows: &'a [&'a [&'a str]],
}

pub fn sheet<'a>(name: &'a str, headers: &'a [&'a str], rows: &'a [&'a [&'a str]]) -> SheetFixture<'a> {
    SheetFixture {
        name,
        headers,
        rows,
    }
}

/// Builds an .xlsx workbook in memory
pub fn workbook_bytes(sheets: &[SheetFixture<'_>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    for fixture in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(fixture.name).expect("sheet name");
        worksheet
            .write_string(0, 0, format!("{} report", fixture.name))
            .expect("title");
        for (col, header) in fixture.headers.iter().enumerate() {
            worksheet
                .write_string(1, col as u16, *header)
                .expect("header");
        }
        for (row, values) in fixture.rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                if !value.is_empty() {
                    worksheet
                        .write_string(row as u32 + 2, col as u16, *value)
                        .expect("cell");
                }
            }
        }
    }
    workbook.save_to_buffer().expect("workbook bytes")
}

/// Scratch directory holding a database file and workbooks for one test.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.temp_dir.path().join("sheetload.db").display())
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url(),
            ..StoreConfig::default()
        }
    }

    /// Writes a workbook under the workspace and returns its path
    pub fn write_workbook(&self, file_name: &str, sheets: &[SheetFixture<'_>]) -> PathBuf {
        let path = self.temp_dir.path().join(file_name);
        std::fs::write(&path, workbook_bytes(sheets)).expect("write workbook");
        path
    }

    pub async fn store(&self) -> Store {
        Store::connect(&self.store_config()).await.expect("connect store")
    }

    pub async fn service(&self) -> IngestService {
        self.service_with(IngestConfig::default()).await
    }

    pub async fn service_with(&self, config: IngestConfig) -> IngestService {
        IngestService::new(self.store().await, config)
    }
}

pub const SALES_HEADERS: &[&str] = &["Dealer", "Sales", "Region"];

/// The two-region Sales Q1 2025 workbook: two rows on Central (one
/// without a dealer) and one on NW.
pub fn sales_q1_sheets() -> Vec<SheetFixture<'static>> {
    vec![
        sheet(
            "Q1-Central",
            SALES_HEADERS,
            &[&["D1", "100", "Wrong"], &["", "50", ""]],
        ),
        sheet("Q1-NW", SALES_HEADERS, &[&["D2", "75", ""]]),
    ]
}
