//! Workbook reader - uploaded .xlsx bytes → raw text sheets

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use chrono::Timelike;

use crate::error::{SheetloadError, SheetloadResult};
use crate::ingest::RawSheet;

/// Read every worksheet of an .xlsx workbook, in workbook order
pub fn read_workbook(bytes: Vec<u8>) -> SheetloadResult<Vec<RawSheet>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| SheetloadError::FileFormat(format!("Failed to open Excel file: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
            SheetloadError::FileFormat(format!("Failed to read sheet '{}': {}", sheet_name, e))
        })?;
        sheets.push(RawSheet::new(sheet_name, range_to_rows(&range)));
    }
    Ok(sheets)
}

/// Rows of text anchored at A1, whatever cell the used range starts at
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<Option<String>>> {
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };

    (0..=last_row)
        .map(|row| {
            (0..=last_col)
                .map(|col| range.get_value((row, col)).and_then(cell_text))
                .collect()
        })
        .collect()
}

/// Render one cell as text; blanks and error cells become `None`
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(format_number(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(value) if value.num_seconds_from_midnight() == 0 => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format_number(dt.as_f64()),
        }),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Whole floats print without a fractional part
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
