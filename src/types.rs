use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

//==============================================================================
// Reporting Period
//==============================================================================

/// Calendar quarter of a reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// Quarter from its number (1-4)
    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Quarter::Q1),
            2 => Some(Quarter::Q2),
            3 => Some(Quarter::Q3),
            4 => Some(Quarter::Q4),
            _ => None,
        }
    }

    /// Quarter containing the given month (1-12)
    pub fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    pub fn number(self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

/// Period metadata derived once per uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub category: String,
    pub quarter: Quarter,
    pub year: i32,
    pub table_name: String,
}

/// Metadata for one sheet. The region comes from the sheet name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetInfo {
    pub name: String,
    pub category: String,
    pub quarter: Quarter,
    pub year: i32,
    pub region: String,
    pub table_name: String,
}

//==============================================================================
// Columns and Rows
//==============================================================================

/// Storage-safe column name: `[a-z_][a-z0-9_]*`, at most 63 characters.
///
/// Only the header sanitizer and [`ColumnIdent::parse`] construct these, so
/// an identifier can be spliced into DDL between double quotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ColumnIdent(String);

impl ColumnIdent {
    pub const MAX_LEN: usize = 63;

    pub(crate) fn new_unchecked(value: String) -> Self {
        debug_assert!(Self::is_valid(&value), "invalid identifier {value:?}");
        ColumnIdent(value)
    }

    /// Accept an already-sanitized identifier
    pub fn parse(value: &str) -> Option<Self> {
        Self::is_valid(value).then(|| ColumnIdent(value.to_string()))
    }

    pub fn is_valid(value: &str) -> bool {
        let mut chars = value.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() || c == '_' => {}
            _ => return false,
        }
        value.len() <= Self::MAX_LEN
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ColumnIdent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One data row of a sheet, values ordered like the sheet's columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    pub region: String,
    pub values: Vec<(ColumnIdent, Option<String>)>,
}

impl RowRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(ident, _)| ident.as_str() == column)
            .and_then(|(_, value)| value.as_deref())
    }
}

/// The one column list every sheet of an ingestion must share
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedSchema {
    columns: Vec<ColumnIdent>,
}

impl UnifiedSchema {
    pub fn new(columns: Vec<ColumnIdent>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnIdent] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.as_str() == column)
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.to_string()).collect()
    }
}

//==============================================================================
// Ingestion Outcome
//==============================================================================

/// A table touched by an ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table_name: String,
    pub rows_count: u64,
    pub columns: Vec<String>,
}

/// An error attributed to a sheet, or to the whole workbook when unnamed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    pub message: String,
}

impl SheetError {
    pub fn sheet(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sheet_name: Some(name.into()),
            message: message.into(),
        }
    }

    pub fn workbook(message: impl Into<String>) -> Self {
        Self {
            sheet_name: None,
            message: message.into(),
        }
    }
}

/// Result of one ingestion call. Never partial: on failure nothing was loaded.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionResult {
    pub success: bool,
    pub tables_created: Vec<TableSummary>,
    pub errors: Vec<SheetError>,
    pub total_rows: u64,
    #[serde(serialize_with = "serialize_millis")]
    pub processing_time: Duration,
}

impl IngestionResult {
    pub fn failed(errors: Vec<SheetError>, processing_time: Duration) -> Self {
        Self {
            success: false,
            tables_created: Vec::new(),
            errors,
            total_rows: 0,
            processing_time,
        }
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Catalog view of a materialized table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    pub table_name: String,
    pub category: String,
    pub quarter: Quarter,
    pub year: i32,
    pub row_count: u64,
    pub columns: Vec<String>,
    pub created_at: chrono::NaiveDateTime,
    pub last_ingested_at: chrono::NaiveDateTime,
    pub ingest_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_from_month() {
        assert_eq!(Quarter::from_month(1), Quarter::Q1);
        assert_eq!(Quarter::from_month(6), Quarter::Q2);
        assert_eq!(Quarter::from_month(9), Quarter::Q3);
        assert_eq!(Quarter::from_month(12), Quarter::Q4);
    }

    #[test]
    fn test_quarter_display_and_number() {
        assert_eq!(Quarter::Q3.to_string(), "Q3");
        assert_eq!(Quarter::from_number(4), Some(Quarter::Q4));
        assert_eq!(Quarter::from_number(5), None);
    }

    #[test]
    fn test_column_ident_validation() {
        assert!(ColumnIdent::parse("dealer").is_some());
        assert!(ColumnIdent::parse("_x1").is_some());
        assert!(ColumnIdent::parse("1st").is_none());
        assert!(ColumnIdent::parse("Dealer").is_none());
        assert!(ColumnIdent::parse("a b").is_none());
        assert!(ColumnIdent::parse("").is_none());
        assert!(ColumnIdent::parse(&"a".repeat(64)).is_none());
    }

    #[test]
    fn test_row_record_get() {
        let row = RowRecord {
            region: "Central".to_string(),
            values: vec![
                (ColumnIdent::new_unchecked("dealer".into()), Some("D1".into())),
                (ColumnIdent::new_unchecked("sales".into()), None),
            ],
        };
        assert_eq!(row.get("dealer"), Some("D1"));
        assert_eq!(row.get("sales"), None);
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_ingestion_result_serializes_millis() {
        let result = IngestionResult::failed(
            vec![SheetError::workbook("boom")],
            Duration::from_millis(1500),
        );
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"processing_time\":1500"));
        assert!(json.contains("\"success\":false"));
        assert!(!json.contains("sheet_name"));
    }
}
