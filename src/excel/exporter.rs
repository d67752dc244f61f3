//! Table exporter - materialized table → .xlsx in the ingestion layout
//!
//! One worksheet per region named `Q<n>-<region>`: a title in row 1, headers
//! in row 2, data from row 3. Exported files can be ingested again.

use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::SheetloadResult;
use crate::ingest::REGION_COLUMN;
use crate::types::TableMetadata;

/// Excel's worksheet name limit
const MAX_SHEET_NAME: usize = 31;

pub struct TableExporter {
    metadata: TableMetadata,
    rows: Vec<Vec<Option<String>>>,
}

impl TableExporter {
    /// `rows` are ordered like `metadata.columns`
    pub fn new(metadata: TableMetadata, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { metadata, rows }
    }

    /// Write the workbook to a file
    pub fn export(&self, output_path: &Path) -> SheetloadResult<()> {
        let mut workbook = self.build()?;
        workbook.save(output_path)?;
        Ok(())
    }

    /// Workbook bytes, for HTTP responses and tests
    pub fn to_buffer(&self) -> SheetloadResult<Vec<u8>> {
        let mut workbook = self.build()?;
        Ok(workbook.save_to_buffer()?)
    }

    fn build(&self) -> SheetloadResult<Workbook> {
        let mut workbook = Workbook::new();
        let groups = self.group_by_region();
        let quarter = self.metadata.quarter.number();
        let mut used = HashSet::new();

        if groups.is_empty() {
            let worksheet = workbook.add_worksheet();
            let name = unique_sheet_name(sheet_name(quarter, "All"), &mut used);
            self.write_sheet(worksheet, &name, "All", &[])?;
        }
        for (region, rows) in &groups {
            let worksheet = workbook.add_worksheet();
            let name = unique_sheet_name(sheet_name(quarter, region), &mut used);
            self.write_sheet(worksheet, &name, region, rows)?;
        }
        Ok(workbook)
    }

    /// Rows grouped by region in first-seen order
    fn group_by_region(&self) -> Vec<(String, Vec<&Vec<Option<String>>>)> {
        let region_index = self
            .metadata
            .columns
            .iter()
            .position(|c| c == REGION_COLUMN);

        let mut groups: Vec<(String, Vec<&Vec<Option<String>>>)> = Vec::new();
        for row in &self.rows {
            let region = region_index
                .and_then(|i| row.get(i).cloned().flatten())
                .unwrap_or_else(|| "All".to_string());
            match groups.iter_mut().find(|(name, _)| *name == region) {
                Some((_, rows)) => rows.push(row),
                None => groups.push((region, vec![row])),
            }
        }
        groups
    }

    fn write_sheet(
        &self,
        worksheet: &mut Worksheet,
        name: &str,
        region: &str,
        rows: &[&Vec<Option<String>>],
    ) -> SheetloadResult<()> {
        worksheet.set_name(name)?;

        let bold = Format::new().set_bold();
        let title = format!(
            "{} {} {} - {}",
            self.metadata.category, self.metadata.quarter, self.metadata.year, region
        );
        worksheet.write_string_with_format(0, 0, &title, &bold)?;

        for (col_idx, column) in self.metadata.columns.iter().enumerate() {
            worksheet.write_string_with_format(1, col_idx as u16, column, &bold)?;
        }

        for (row_idx, row) in rows.iter().enumerate() {
            let excel_row = row_idx as u32 + 2;
            for (col_idx, value) in row.iter().enumerate() {
                if let Some(value) = value {
                    worksheet.write_string(excel_row, col_idx as u16, value)?;
                }
            }
        }
        Ok(())
    }
}

/// `Q<n>-<region>` with characters Excel forbids in sheet names replaced
fn sheet_name(quarter: u32, region: &str) -> String {
    let cleaned: String = region
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' | '-' => ' ',
            other => other,
        })
        .collect();
    let mut name = format!("Q{}-{}", quarter, cleaned.trim());
    while name.chars().count() > MAX_SHEET_NAME {
        name.pop();
    }
    name
}

/// Excel compares sheet names case-insensitively; repeats get a ` (n)` suffix
fn unique_sheet_name(base: String, used: &mut HashSet<String>) -> String {
    if used.insert(base.to_lowercase()) {
        return base;
    }
    let mut n = 2;
    loop {
        let suffix = format!(" ({n})");
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        let candidate: String = base.chars().take(keep).collect::<String>() + &suffix;
        if used.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}
