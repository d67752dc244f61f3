//! Metadata parser: reporting period from the filename, region from the sheet name.
//!
//! Filenames follow `<Category>_Q<1-4>_<YYYY>`, sheet names `Q<1-4>-<Region>`.
//! The filename parser never fails; missing parts fall back to the current
//! calendar period. Sheet names are strict.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use tracing::warn;

use super::headers::normalize_identifier;
use crate::error::{SheetloadError, SheetloadResult};
use crate::types::{FileInfo, Quarter, SheetInfo};

/// Category used when the filename has nothing before the quarter token
pub const DEFAULT_CATEGORY: &str = "data";

/// Region abbreviations with a canonical long name
const REGION_NAMES: &[(&str, &str)] = &[
    ("NW", "North West"),
    ("FE", "Far East"),
    ("NC", "North Caucasus"),
];

fn quarter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(?:^|[^a-z0-9])q([1-4])(?:[\s_\-]*(\d{4}))?(?:[^0-9]|$)")
            .expect("quarter pattern is valid")
    })
}

/// Derive category, quarter, year and table name from an uploaded filename
pub fn parse_file_name(name: &str) -> FileInfo {
    parse_file_name_on(name, Local::now().date_naive())
}

/// [`parse_file_name`] with an explicit "today" for the fallback period
pub fn parse_file_name_on(name: &str, today: NaiveDate) -> FileInfo {
    // browsers and Windows clients may send a full path with either separator
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);

    let (category_raw, quarter, year) = match quarter_pattern().captures(stem) {
        Some(caps) => {
            let token = caps.get(0).map(|m| m.start()).unwrap_or(0);
            let quarter = caps
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .and_then(Quarter::from_number);
            let year = caps.get(2).and_then(|m| m.as_str().parse().ok());
            (&stem[..token], quarter, year)
        }
        None => (stem, None, None),
    };

    if quarter.is_none() || year.is_none() {
        warn!(
            file = name,
            "Filename lacks a full Q<n>_<YYYY> period; using the current period for missing parts"
        );
    }
    let quarter = quarter.unwrap_or_else(|| Quarter::from_month(today.month()));
    let year = year.unwrap_or_else(|| today.year());

    let mut category = normalize_identifier(category_raw);
    if category.is_empty() {
        category = DEFAULT_CATEGORY.to_string();
    }

    let table_name = table_name_for(&category, quarter, year);
    FileInfo {
        category,
        quarter,
        year,
        table_name,
    }
}

/// Destination table name: `<category>_q<n>_<yyyy>`, at most 63 characters
pub fn table_name_for(category: &str, quarter: Quarter, year: i32) -> String {
    let suffix = format!("_q{}_{}", quarter.number(), year);
    let mut category = category.to_string();
    category.truncate(63usize.saturating_sub(suffix.len()));
    format!("{}{}", category, suffix)
}

/// Region from a `<period>-<abbreviation>` sheet name
pub fn extract_region(sheet_name: &str) -> SheetloadResult<String> {
    let parts: Vec<&str> = sheet_name.split('-').collect();
    if parts.len() != 2 {
        return Err(SheetloadError::RegionParse {
            sheet: sheet_name.to_string(),
            reason: format!(
                "expected a name like 'Q1-NW' with exactly one '-', found {} part(s)",
                parts.len()
            ),
        });
    }

    let abbreviation = parts[1].trim();
    if abbreviation.is_empty() {
        return Err(SheetloadError::RegionParse {
            sheet: sheet_name.to_string(),
            reason: "region part after '-' is empty".to_string(),
        });
    }

    let region = REGION_NAMES
        .iter()
        .find(|(abbr, _)| abbr.eq_ignore_ascii_case(abbreviation))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| abbreviation.to_string());
    Ok(region)
}

/// Sheet-level metadata: file period plus the sheet's own region
pub fn parse_sheet_info(file: &FileInfo, sheet_name: &str) -> SheetloadResult<SheetInfo> {
    let region = extract_region(sheet_name)?;

    let period = sheet_name.split('-').next().unwrap_or_default().trim();
    if !period.eq_ignore_ascii_case(&file.quarter.to_string()) {
        warn!(
            sheet = sheet_name,
            file_quarter = %file.quarter,
            "Sheet period token differs from the file quarter; loading into the file's table"
        );
    }

    Ok(SheetInfo {
        name: sheet_name.to_string(),
        category: file.category.clone(),
        quarter: file.quarter,
        year: file.year,
        region,
        table_name: file.table_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 14).unwrap()
    }

    #[test]
    fn test_parse_standard_filename() {
        let info = parse_file_name_on("Sales_Q1_2025.xlsx", today());
        assert_eq!(info.category, "sales");
        assert_eq!(info.quarter, Quarter::Q1);
        assert_eq!(info.year, 2025);
        assert_eq!(info.table_name, "sales_q1_2025");
    }

    #[test]
    fn test_parse_strips_client_directories() {
        let info = parse_file_name_on(r"C:\fakepath\Sales_Q1_2025.xlsx", today());
        assert_eq!(info.category, "sales");
        assert_eq!(info.table_name, "sales_q1_2025");

        let info = parse_file_name_on("uploads/2025/Inventory_Q3_2024.xlsx", today());
        assert_eq!(info.category, "inventory");
        assert_eq!(info.table_name, "inventory_q3_2024");
    }

    #[test]
    fn test_parse_is_case_insensitive_and_space_separated() {
        let info = parse_file_name_on("Dealer Performance q3 2024.XLSX", today());
        assert_eq!(info.category, "dealer_performance");
        assert_eq!(info.quarter, Quarter::Q3);
        assert_eq!(info.year, 2024);
        assert_eq!(info.table_name, "dealer_performance_q3_2024");
    }

    #[test]
    fn test_missing_year_uses_current_year() {
        let info = parse_file_name_on("Sales_Q2.xlsx", today());
        assert_eq!(info.quarter, Quarter::Q2);
        assert_eq!(info.year, 2026);
        assert_eq!(info.table_name, "sales_q2_2026");
    }

    #[test]
    fn test_missing_quarter_uses_current_period() {
        let info = parse_file_name_on("Sales Report.xlsx", today());
        assert_eq!(info.category, "sales_report");
        assert_eq!(info.quarter, Quarter::Q3);
        assert_eq!(info.year, 2026);
    }

    #[test]
    fn test_quarter_inside_word_is_ignored() {
        let info = parse_file_name_on("FAQ1_notes.xlsx", today());
        assert_eq!(info.quarter, Quarter::Q3);
        assert_eq!(info.category, "faq1_notes");
    }

    #[test]
    fn test_empty_category_defaults() {
        let info = parse_file_name_on("Q4_2023.xlsx", today());
        assert_eq!(info.category, DEFAULT_CATEGORY);
        assert_eq!(info.table_name, "data_q4_2023");
    }

    #[test]
    fn test_table_name_length_capped() {
        let name = format!("{}_Q1_2025.xlsx", "Category".repeat(12));
        let info = parse_file_name_on(&name, today());
        assert_eq!(info.table_name.len(), 63);
        assert!(info.table_name.ends_with("_q1_2025"));
    }

    #[test]
    fn test_extract_region_known_abbreviations() {
        assert_eq!(extract_region("Q1-NW").unwrap(), "North West");
        assert_eq!(extract_region("Q1-fe").unwrap(), "Far East");
    }

    #[test]
    fn test_extract_region_unknown_passes_through() {
        assert_eq!(extract_region("Q1-Central").unwrap(), "Central");
        assert_eq!(extract_region("Q1- Volga ").unwrap(), "Volga");
    }

    #[test]
    fn test_extract_region_requires_one_separator() {
        assert!(matches!(
            extract_region("Sheet1"),
            Err(SheetloadError::RegionParse { .. })
        ));
        assert!(extract_region("Q1-North-West").is_err());
        assert!(extract_region("Q1-").is_err());
    }

    #[test]
    fn test_parse_sheet_info_carries_file_period() {
        let file = parse_file_name_on("Sales_Q1_2025.xlsx", today());
        let sheet = parse_sheet_info(&file, "Q1-NW").unwrap();
        assert_eq!(sheet.region, "North West");
        assert_eq!(sheet.quarter, Quarter::Q1);
        assert_eq!(sheet.year, 2025);
        assert_eq!(sheet.table_name, "sales_q1_2025");
        assert_eq!(sheet.category, "sales");
    }
}
