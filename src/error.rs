use thiserror::Error;

pub type SheetloadResult<T> = Result<T, SheetloadError>;

#[derive(Error, Debug)]
pub enum SheetloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported file: {0}")]
    FileFormat(String),

    #[error("File too large: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Sheet '{sheet}': {reason}")]
    RegionParse { sheet: String, reason: String },

    #[error("Sheet '{sheet}' does not match the workbook schema: {detail}")]
    SchemaMismatch { sheet: String, detail: String },

    #[error("Table '{table}' cannot take this workbook: {detail}")]
    ExistingTableMismatch { table: String, detail: String },

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Table not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("{failed} of {total} workbook(s) failed to ingest")]
    IngestionFailed { failed: usize, total: usize },
}

impl SheetloadError {
    /// True for errors raised before any processing of the upload started.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SheetloadError::FileFormat(_) | SheetloadError::FileTooLarge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_message() {
        let err = SheetloadError::FileTooLarge {
            size: 2048,
            max: 1024,
        };
        assert_eq!(
            err.to_string(),
            "File too large: 2048 bytes exceeds the 1024 byte limit"
        );
        assert!(err.is_rejection());
    }

    #[test]
    fn test_schema_mismatch_names_sheet() {
        let err = SheetloadError::SchemaMismatch {
            sheet: "Q1-NW".to_string(),
            detail: "expected 3 columns, found 4".to_string(),
        };
        assert!(err.to_string().contains("Q1-NW"));
        assert!(!err.is_rejection());
    }
}
