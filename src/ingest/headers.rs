//! Header sanitizer: raw header text → unique storage-safe column identifiers

use std::collections::{HashMap, HashSet};

use crate::types::ColumnIdent;

/// Column names the materialized table already uses for itself
pub const RESERVED_COLUMNS: &[&str] = &["id", "created_at"];

/// A sanitized header and the raw column it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedHeader {
    pub ident: ColumnIdent,
    pub source_index: usize,
}

/// Lower-case, map separators to `_`, spell out `%`, collapse and trim underscores.
///
/// Anything outside `[a-z0-9_]` becomes `_`, so the output is always a valid
/// identifier body (possibly empty, possibly digit-led).
pub fn normalize_identifier(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let mut mapped = String::with_capacity(lower.len());
    for c in lower.chars() {
        match c {
            '%' => mapped.push_str("_percent"),
            'a'..='z' | '0'..='9' | '_' => mapped.push(c),
            // space - . / \ ( ) and any other symbol or non-ASCII letter
            _ => mapped.push('_'),
        }
    }

    let mut collapsed = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches('_').to_string()
}

/// Sanitize a header row, keeping each identifier's source column.
///
/// Blank headers are dropped. Digit-led or empty results fall back to
/// `column_<position>` using the 1-based position in the raw row.
pub fn sanitize_header_row<S: AsRef<str>>(raw: &[S]) -> Vec<SanitizedHeader> {
    let mut used: HashSet<String> = RESERVED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    raw.iter()
        .enumerate()
        .filter(|(_, header)| !header.as_ref().trim().is_empty())
        .map(|(index, header)| {
            let mut base = normalize_identifier(header.as_ref());
            if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
                base = format!("column_{}", index + 1);
            }
            base.truncate(ColumnIdent::MAX_LEN);

            let name = claim_unique(base, &mut used, &mut occurrences);
            SanitizedHeader {
                ident: ColumnIdent::new_unchecked(name),
                source_index: index,
            }
        })
        .collect()
}

/// Sanitize a header row to identifiers only
pub fn sanitize_headers<S: AsRef<str>>(raw: &[S]) -> Vec<ColumnIdent> {
    sanitize_header_row(raw)
        .into_iter()
        .map(|header| header.ident)
        .collect()
}

/// Reserve `base`, or `base_<n>` for the first free n when taken.
/// The base is shortened so the suffixed name still fits the length limit.
fn claim_unique(
    base: String,
    used: &mut HashSet<String>,
    occurrences: &mut HashMap<String, usize>,
) -> String {
    if used.insert(base.clone()) {
        return base;
    }

    let count = occurrences.entry(base.clone()).or_insert(0);
    loop {
        *count += 1;
        let suffix = format!("_{}", count);
        let mut candidate = base.clone();
        candidate.truncate(ColumnIdent::MAX_LEN - suffix.len());
        candidate.push_str(&suffix);
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }
}
