//! Reporting period lookup in the export's metadata block.
//!
//! The period sits in a fixed cell near the top of the sheet, usually as a
//! date or a `2024-05-01 ~ 2024-05-31` style string. Its first seven
//! characters are taken as `YYYY-MM`. Nothing here fails: a missing or
//! empty cell simply yields no period.

use serde_json::Value;

use crate::config::IngestOptions;
use crate::models::{cell_text, is_blank};

/// Period label from the top rows of a sheet, if one can be found.
pub fn extract_period(rows: &[Vec<Value>], options: &IngestOptions) -> Option<String> {
    let scan = &rows[..rows.len().min(options.period_scan_rows)];
    let cell = non_blank_cell(scan, options.period_cell)
        .or_else(|| non_blank_cell(scan, options.period_fallback_cell))?;

    let period: String = cell_text(cell)
        .trim()
        .chars()
        .take(options.period_len)
        .collect();
    (!period.is_empty()).then_some(period)
}

fn non_blank_cell(rows: &[Vec<Value>], (row, col): (usize, usize)) -> Option<&Value> {
    rows.get(row)?.get(col).filter(|v| !is_blank(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn header_block(period_row: Vec<Value>) -> Vec<Vec<Value>> {
        vec![
            vec![json!("JollyJupiter 出席報表")],
            vec![],
            vec![json!("分校"), json!("全部")],
            period_row,
            vec![],
        ]
    }

    #[test]
    fn test_primary_cell() {
        let rows = header_block(vec![json!("期間"), Value::Null, json!("2024-05-01 ~ 2024-05-31")]);
        assert_eq!(extract_period(&rows, &IngestOptions::default()), Some("2024-05".into()));
    }

    #[test]
    fn test_fallback_cell_when_primary_empty() {
        let rows = header_block(vec![json!("期間"), json!("2024-06-01"), Value::Null]);
        assert_eq!(extract_period(&rows, &IngestOptions::default()), Some("2024-06".into()));

        let rows = header_block(vec![json!("期間"), json!("2024-06-01")]);
        assert_eq!(extract_period(&rows, &IngestOptions::default()), Some("2024-06".into()));
    }

    #[test]
    fn test_missing_cells_yield_none() {
        assert_eq!(extract_period(&[], &IngestOptions::default()), None);

        let rows = header_block(vec![json!("期間")]);
        assert_eq!(extract_period(&rows, &IngestOptions::default()), None);
    }

    #[test]
    fn test_short_values_kept_whole() {
        let rows = header_block(vec![Value::Null, Value::Null, json!(2024)]);
        assert_eq!(extract_period(&rows, &IngestOptions::default()), Some("2024".into()));
    }

    #[test]
    fn test_cell_beyond_scan_rows_ignored() {
        let options = IngestOptions {
            period_scan_rows: 3,
            ..IngestOptions::default()
        };
        let rows = header_block(vec![Value::Null, Value::Null, json!("2024-05")]);
        assert_eq!(extract_period(&rows, &options), None);
    }
}
