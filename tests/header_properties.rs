//! Header sanitizer properties over generated header rows

use std::collections::HashSet;

use proptest::prelude::*;
use regex::Regex;
use sheetload::ingest::{sanitize_header_row, sanitize_headers};
use sheetload::types::ColumnIdent;

fn header_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // spreadsheet-looking headers
        "[A-Za-z][A-Za-z0-9 ()%./-]{0,20}",
        // duplicates and reserved names show up often in real sheets
        Just("Dealer".to_string()),
        Just("ID".to_string()),
        Just("created_at".to_string()),
        Just("Sales (USD)".to_string()),
        // digit-led, symbol-only and blank
        "[0-9][a-z0-9]{0,5}",
        "[%#!@ ]{0,4}",
        // very long
        "[a-z_]{60,80}",
        // anything at all
        any::<String>(),
    ]
}

proptest! {
    #[test]
    fn test_sanitized_headers_are_valid_and_distinct(
        raw in proptest::collection::vec(header_strategy(), 0..24)
    ) {
        let pattern = Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap();
        let idents = sanitize_headers(&raw);

        let mut seen = HashSet::new();
        for ident in &idents {
            let name = ident.as_str();
            prop_assert!(pattern.is_match(name), "invalid identifier {:?}", name);
            prop_assert!(name.len() <= ColumnIdent::MAX_LEN, "too long: {:?}", name);
            prop_assert!(name != "id" && name != "created_at", "reserved: {:?}", name);
            prop_assert!(seen.insert(name.to_string()), "duplicate: {:?}", name);
        }

        let non_blank = raw.iter().filter(|h| !h.trim().is_empty()).count();
        prop_assert_eq!(idents.len(), non_blank);
    }

    #[test]
    fn test_source_indexes_point_at_non_blank_headers(
        raw in proptest::collection::vec(header_strategy(), 0..24)
    ) {
        let headers = sanitize_header_row(&raw);
        let mut previous = None;
        for header in &headers {
            prop_assert!(!raw[header.source_index].trim().is_empty());
            if let Some(prev) = previous {
                prop_assert!(header.source_index > prev);
            }
            previous = Some(header.source_index);
        }
    }
}
