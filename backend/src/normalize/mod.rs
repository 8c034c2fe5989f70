//! Cleaning helpers for values and headers coming out of the export.
//!
//! The export is typed by hand, so school names carry internal codes and
//! some headers arrive misspelled. Everything here is pure and never fails.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::{cell_text, columns, Table};

/// Internal code in front of a school name: `_A1_`.
static SCHOOL_CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^_[^_]+_").expect("valid school prefix regex"));

/// Known header misspellings and the column name they stand for.
///
/// A misspelling is only renamed when the canonical column is absent.
pub const HEADER_REPAIRS: &[(&str, &str)] = &[("學栍姓名", columns::STUDENT_NAME)];

/// P1–P6 and their localized labels.
const GRADE_LABELS: [(&str, &str); 6] = [
    ("P1", "一年級"),
    ("P2", "二年級"),
    ("P3", "三年級"),
    ("P4", "四年級"),
    ("P5", "五年級"),
    ("P6", "六年級"),
];

/// Strip one leading `_code_` segment from a school name.
///
/// Non-text cells are turned into text first.
pub fn normalize_school_name(value: &Value) -> String {
    clean_school_name(&cell_text(value))
}

/// [`normalize_school_name`] for text already in hand.
pub fn clean_school_name(name: &str) -> String {
    SCHOOL_CODE_PREFIX.replace(name, "").into_owned()
}

/// Rename known misspelled headers to their canonical names.
pub fn repair_headers(mut table: Table) -> Table {
    for (from, to) in pending_header_repairs(&table) {
        table.rename_column(from, to);
    }
    table
}

/// Repairs [`repair_headers`] would apply to this table.
pub fn pending_header_repairs(table: &Table) -> Vec<(&'static str, &'static str)> {
    HEADER_REPAIRS
        .iter()
        .copied()
        .filter(|(from, to)| table.has_column(from) && !table.has_column(to))
        .collect()
}

/// Localized label for P1–P6; any other code comes back unchanged.
pub fn translate_grade(code: &str) -> String {
    grade_label(code).unwrap_or(code).to_string()
}

/// Localized label when `code` is exactly one of P1–P6.
pub fn grade_label(code: &str) -> Option<&'static str> {
    GRADE_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}
