//! Spreadsheet reading via calamine (xls, xlsx, xlsm, xlsb, ods).
//!
//! Only the first sheet is read. Cells are placed at their absolute
//! positions: if the used range starts at C4, rows 0–2 and columns A–B come
//! back as empty cells, so fixed offsets like "header on row 6" hold no
//! matter how the sheet was saved.

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use chrono::{NaiveDateTime, Timelike};
use serde_json::Value;
use std::io::Cursor;

use crate::error::WorkbookError;
use crate::models::number_value;

/// Cells of one sheet, row-major, from A1.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub sheet: String,
    pub rows: Vec<Vec<Value>>,
}

/// Read the first sheet of a workbook held in memory.
pub fn read_first_sheet(bytes: &[u8]) -> Result<SheetGrid, WorkbookError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| WorkbookError::OpenError(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(WorkbookError::NoWorksheet)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(WorkbookError::NoWorksheet)?
        .map_err(|e| WorkbookError::OpenError(e.to_string()))?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Value>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Value::Null; start_col as usize];
        cells.extend(row.iter().map(cell_to_value));
        rows.push(cells);
    }

    Ok(SheetGrid { sheet, rows })
}

/// Convert a calamine cell to a JSON cell.
///
/// Whole floats become integers (Excel stores every number as a float, and
/// a student ID of `1001.0` should read as `1001`). Dates become text.
pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => number_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| Value::String(format_datetime(dt)))
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        _ => Value::Null,
    }
}

/// `YYYY-MM-DD` for midnight, `YYYY-MM-DD HH:MM:SS` otherwise.
pub fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.num_seconds_from_midnight() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
