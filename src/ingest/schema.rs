//! Schema unifier: the first sheet's columns are canonical, every later sheet must match.

use crate::error::{SheetloadError, SheetloadResult};
use crate::types::{ColumnIdent, UnifiedSchema};

#[derive(Debug, Default)]
pub struct SchemaUnifier {
    canonical: Option<UnifiedSchema>,
    canonical_sheet: String,
}

impl SchemaUnifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt the columns on first use; afterwards require an identical list.
    pub fn unify(&mut self, sheet_name: &str, columns: &[ColumnIdent]) -> SheetloadResult<()> {
        let Some(canonical) = &self.canonical else {
            self.canonical = Some(UnifiedSchema::new(columns.to_vec()));
            self.canonical_sheet = sheet_name.to_string();
            return Ok(());
        };

        if canonical.columns() == columns {
            return Ok(());
        }

        Err(SheetloadError::SchemaMismatch {
            sheet: sheet_name.to_string(),
            detail: describe_mismatch(&self.canonical_sheet, canonical.columns(), columns),
        })
    }

    pub fn schema(&self) -> Option<&UnifiedSchema> {
        self.canonical.as_ref()
    }

    pub fn into_schema(self) -> Option<UnifiedSchema> {
        self.canonical
    }
}

fn describe_mismatch(reference: &str, expected: &[ColumnIdent], found: &[ColumnIdent]) -> String {
    let missing: Vec<&str> = expected
        .iter()
        .filter(|c| !found.contains(c))
        .map(|c| c.as_str())
        .collect();
    let extra: Vec<&str> = found
        .iter()
        .filter(|c| !expected.contains(c))
        .map(|c| c.as_str())
        .collect();

    let mut parts = Vec::new();
    if expected.len() != found.len() {
        parts.push(format!(
            "expected {} columns (as in '{}'), found {}",
            expected.len(),
            reference,
            found.len()
        ));
    }
    if !missing.is_empty() {
        parts.push(format!("missing: {}", missing.join(", ")));
    }
    if !extra.is_empty() {
        parts.push(format!("unexpected: {}", extra.join(", ")));
    }
    if parts.is_empty() {
        // same set, different order
        if let Some(pos) = expected.iter().zip(found).position(|(a, b)| a != b) {
            parts.push(format!(
                "column {} is '{}' but '{}' has '{}' there",
                pos + 1,
                found[pos],
                reference,
                expected[pos]
            ));
        }
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::headers::sanitize_headers;

    #[test]
    fn test_first_sheet_becomes_canonical() {
        let mut unifier = SchemaUnifier::new();
        let cols = sanitize_headers(&["Dealer", "Sales"]);
        unifier.unify("Q1-Central", &cols).unwrap();
        assert_eq!(unifier.schema().unwrap().columns(), cols.as_slice());
    }

    #[test]
    fn test_identical_sheets_unify() {
        let mut unifier = SchemaUnifier::new();
        let cols = sanitize_headers(&["Dealer", "Sales"]);
        unifier.unify("Q1-Central", &cols).unwrap();
        unifier.unify("Q1-NW", &cols).unwrap();
        unifier.unify("Q1-FE", &cols).unwrap();
        assert_eq!(unifier.into_schema().unwrap().len(), 2);
    }

    #[test]
    fn test_extra_column_rejected() {
        let mut unifier = SchemaUnifier::new();
        unifier
            .unify("Q1-Central", &sanitize_headers(&["Dealer", "Sales"]))
            .unwrap();
        let err = unifier
            .unify("Q1-NW", &sanitize_headers(&["Dealer", "Sales", "Bonus"]))
            .unwrap_err();
        match err {
            SheetloadError::SchemaMismatch { sheet, detail } => {
                assert_eq!(sheet, "Q1-NW");
                assert!(detail.contains("expected 2 columns"));
                assert!(detail.contains("unexpected: bonus"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_reordered_columns_rejected() {
        let mut unifier = SchemaUnifier::new();
        unifier
            .unify("Q1-Central", &sanitize_headers(&["Dealer", "Sales"]))
            .unwrap();
        let err = unifier
            .unify("Q1-NW", &sanitize_headers(&["Sales", "Dealer"]))
            .unwrap_err();
        assert!(err.to_string().contains("column 1 is 'sales'"));
    }

    #[test]
    fn test_mismatch_keeps_canonical_schema() {
        let mut unifier = SchemaUnifier::new();
        let cols = sanitize_headers(&["Dealer"]);
        unifier.unify("Q1-Central", &cols).unwrap();
        assert!(unifier.unify("Q1-NW", &sanitize_headers(&["Name"])).is_err());
        assert_eq!(unifier.schema().unwrap().columns(), cols.as_slice());
    }
}
