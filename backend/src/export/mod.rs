//! CSV export of finished reports.
//!
//! Output is UTF-8 with a byte-order mark so Excel opens the Chinese
//! headers correctly. Numbers are written without a trailing `.0`; null
//! cells are written empty.

use serde_json::Value;
use std::io::Write;

use crate::error::ExportError;
use crate::models::{cell_text, Table};

/// UTF-8 byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// MIME type for the download.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Serialize a table to CSV bytes with a BOM.
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>, ExportError> {
    let mut buffer = UTF8_BOM.to_vec();
    write_csv(table, &mut buffer)?;
    Ok(buffer)
}

/// Write a table as CSV (no BOM) to any writer.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&table.columns)?;
    for row in &table.rows {
        csv_writer.write_record(row.iter().map(export_cell))?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn export_cell(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.is_finite() => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => cell_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bom_and_headers() {
        let table = Table::with_rows(
            ["老師", "月份", "學生人數", "本月總收入"],
            vec![vec![json!("Amy"), json!("2024-05"), json!(2), json!(240.5)]],
        );
        let bytes = to_csv_bytes(&table).unwrap();

        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "老師,月份,學生人數,本月總收入\nAmy,2024-05,2,240.5\n");
    }

    #[test]
    fn test_empty_table_keeps_headers() {
        let table = Table::new(["學校", "年級"]);
        let bytes = to_csv_bytes(&table).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "學校,年級\n");
    }

    #[test]
    fn test_cells_rendered() {
        assert_eq!(export_cell(&json!(100.0)), "100");
        assert_eq!(export_cell(&json!(7)), "7");
        assert_eq!(export_cell(&Value::Null), "");
        assert_eq!(export_cell(&json!("a,b")), "a,b");
    }

    #[test]
    fn test_fields_with_commas_quoted() {
        let table = Table::with_rows(["學校"], vec![vec![json!("St. Paul's, Central")]]);
        let mut out = Vec::new();
        write_csv(&table, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "學校\n\"St. Paul's, Central\"\n");
    }
}
