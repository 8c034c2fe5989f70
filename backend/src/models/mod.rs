//! Domain models for the report pipeline.
//!
//! - [`Table`] - ordered columns plus rows of JSON cells (input and output)
//! - [`Template`] - the four report templates and their column contracts
//! - [`Report`] - a finished report: template, period and table
//! - [`DashboardMetrics`] - headline counts shown next to any report
//! - [`columns`] - the spreadsheet column names the templates read and write

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;

// =============================================================================
// Column Names
// =============================================================================

/// Column names as they appear in the attendance export and in reports.
pub mod columns {
    /// Attendance status ("出席" when the student attended).
    pub const ATTENDANCE: &str = "學生出席狀況";
    pub const STUDENT_NAME: &str = "學生姓名";
    pub const STUDENT_ID: &str = "學生編號";
    pub const TEACHER: &str = "老師";
    /// Fee charged for one session.
    pub const FEE: &str = "單堂收費";
    pub const CLASS_DATE: &str = "上課日期";
    pub const SCHOOL: &str = "學校";
    pub const GRADE: &str = "年級";
    /// Amount the student still owes.
    pub const BALANCE: &str = "欠數總額";
    pub const PARENT_EMAIL: &str = "家長電郵";

    // Report-only columns
    pub const PERIOD: &str = "月份";
    pub const STUDENT_COUNT: &str = "學生人數";
    pub const REVENUE: &str = "本月總收入";
    pub const EXPECTED_STUDENTS: &str = "預計學生人數";
    pub const UNPAID_STUDENTS: &str = "未交費學生人數";
    pub const TEACHER_EMAIL: &str = "老師電郵";
}

/// Attendance status value meaning the student attended.
pub const PRESENT: &str = "出席";

// =============================================================================
// Table
// =============================================================================

/// An in-memory table: ordered column names and rows of cells.
///
/// Every row has exactly one cell per column. Cells are JSON values:
/// strings, numbers, booleans or null (empty cell).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with the given headers.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Table with headers and rows; rows are padded or truncated to fit.
    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of a column the template cannot run without.
    pub fn require(&self, name: &str, template: Template) -> Result<usize, ReportError> {
        self.column_index(name)
            .ok_or_else(|| ReportError::MissingColumn {
                column: name.to_string(),
                template: template.label().to_string(),
            })
    }

    /// Append a row, padding with nulls or dropping extra cells.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Rename a column in place. Returns false if `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Cells of one column, top to bottom.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Cell helpers
// =============================================================================

/// Text form of a cell. Null becomes the empty string.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// True for null cells and strings that are empty after trimming.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// JSON number for `n`, as an integer when it has no fractional part.
pub fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Numeric value of a fee/balance cell.
///
/// `Ok(None)` for blank cells, `Err(text)` for text that is not a number.
/// Thousands separators are accepted.
pub fn cell_number(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Number(n) => Ok(n.as_f64()),
        Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        v if is_blank(v) => Ok(None),
        Value::String(s) => s
            .trim()
            .replace(',', "")
            .parse::<f64>()
            .map(Some)
            .map_err(|_| s.clone()),
        other => Err(other.to_string()),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// The four report templates, identified by their exact UI labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Template {
    #[serde(rename = "老師月統計")]
    TeacherSummary,
    #[serde(rename = "學生出席明細")]
    AttendanceDetail,
    #[serde(rename = "下個月預算老師清單（不看出席）")]
    BillingRoster,
    #[serde(rename = "課文詞語墳充家長")]
    ParentContacts,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::TeacherSummary,
        Template::AttendanceDetail,
        Template::BillingRoster,
        Template::ParentContacts,
    ];

    /// Exact label used to select the template.
    pub fn label(self) -> &'static str {
        match self {
            Template::TeacherSummary => "老師月統計",
            Template::AttendanceDetail => "學生出席明細",
            Template::BillingRoster => "下個月預算老師清單（不看出席）",
            Template::ParentContacts => "課文詞語墳充家長",
        }
    }

    /// ASCII alias for command lines.
    pub fn slug(self) -> &'static str {
        match self {
            Template::TeacherSummary => "teacher-summary",
            Template::AttendanceDetail => "attendance-detail",
            Template::BillingRoster => "billing-roster",
            Template::ParentContacts => "parent-contacts",
        }
    }

    /// Columns that must be present before the template runs.
    pub fn required_columns(self) -> &'static [&'static str] {
        use columns::*;
        match self {
            Template::TeacherSummary => &[ATTENDANCE, STUDENT_NAME, TEACHER, FEE],
            Template::AttendanceDetail => &[ATTENDANCE, STUDENT_NAME, TEACHER, CLASS_DATE, FEE],
            Template::BillingRoster => &[SCHOOL, GRADE, TEACHER, STUDENT_ID, BALANCE],
            Template::ParentContacts => &[SCHOOL, GRADE],
        }
    }

    /// Columns used when present but not required.
    pub fn optional_columns(self) -> &'static [&'static str] {
        use columns::*;
        match self {
            Template::ParentContacts => &[STUDENT_ID, STUDENT_NAME, PARENT_EMAIL],
            _ => &[],
        }
    }

    /// Output headers. The parent list drops optional columns the input lacks.
    pub fn output_columns(self) -> &'static [&'static str] {
        use columns::*;
        match self {
            Template::TeacherSummary => &[TEACHER, PERIOD, STUDENT_COUNT, REVENUE],
            Template::AttendanceDetail => &[STUDENT_NAME, TEACHER, CLASS_DATE, FEE, PERIOD],
            Template::BillingRoster => &[
                SCHOOL,
                GRADE,
                EXPECTED_STUDENTS,
                UNPAID_STUDENTS,
                TEACHER,
                TEACHER_EMAIL,
            ],
            Template::ParentContacts => &[STUDENT_ID, STUDENT_NAME, SCHOOL, GRADE, PARENT_EMAIL],
        }
    }

    /// Whether the report carries the period label as a column.
    pub fn uses_period(self) -> bool {
        matches!(self, Template::TeacherSummary | Template::AttendanceDetail)
    }

    /// Download file name.
    pub fn file_name(self) -> String {
        format!("{}.csv", self.label())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Template {
    type Err = ReportError;

    /// Accepts the exact label or the slug.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Template::ALL
            .into_iter()
            .find(|t| t.label() == s || t.slug() == s)
            .ok_or_else(|| ReportError::UnknownTemplate(s.to_string()))
    }
}

// =============================================================================
// Report
// =============================================================================

/// A generated report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub template: Template,
    /// `YYYY-MM`, or empty when it could not be extracted.
    pub period: String,
    pub table: Table,
}

impl Report {
    pub fn file_name(&self) -> String {
        self.template.file_name()
    }
}

// =============================================================================
// Dashboard Metrics
// =============================================================================

/// Headline counts over the whole upload.
///
/// Each count is `None` when its column is missing from the upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_students: Option<usize>,
    pub total_teachers: Option<usize>,
    pub total_grades: Option<usize>,
}

impl DashboardMetrics {
    pub fn from_table(table: &Table) -> Self {
        Self {
            total_students: distinct_count(table, columns::STUDENT_ID),
            total_teachers: distinct_count(table, columns::TEACHER),
            total_grades: distinct_count(table, columns::GRADE),
        }
    }
}

fn distinct_count(table: &Table, column: &str) -> Option<usize> {
    let values = table.column_values(column)?;
    let distinct: std::collections::HashSet<String> = values
        .filter(|v| !v.is_null())
        .map(Value::to_string)
        .collect();
    Some(distinct.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_push_row_pads_and_truncates() {
        let mut table = Table::new(["a", "b"]);
        table.push_row(vec![json!(1)]);
        table.push_row(vec![json!(1), json!(2), json!(3)]);

        assert_eq!(table.rows[0], vec![json!(1), Value::Null]);
        assert_eq!(table.rows[1], vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_require_reports_template_label() {
        let table = Table::new(["老師"]);
        let err = table.require(columns::FEE, Template::TeacherSummary).unwrap_err();
        match err {
            ReportError::MissingColumn { column, template } => {
                assert_eq!(column, "單堂收費");
                assert_eq!(template, "老師月統計");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_from_label_and_slug() {
        assert_eq!(
            "下個月預算老師清單（不看出席）".parse::<Template>().unwrap(),
            Template::BillingRoster
        );
        assert_eq!("parent-contacts".parse::<Template>().unwrap(), Template::ParentContacts);
        assert!("月報".parse::<Template>().is_err());
    }

    #[test]
    fn test_template_serializes_as_label() {
        let json = serde_json::to_value(Template::AttendanceDetail).unwrap();
        assert_eq!(json, json!("學生出席明細"));
        assert_eq!(Template::AttendanceDetail.file_name(), "學生出席明細.csv");
    }

    #[test]
    fn test_period_column_matches_uses_period() {
        for template in Template::ALL {
            assert_eq!(
                template.output_columns().contains(&columns::PERIOD),
                template.uses_period(),
                "{template}"
            );
        }
    }

    #[test]
    fn test_optional_columns_are_output_not_required() {
        for template in Template::ALL {
            for column in template.optional_columns() {
                assert!(template.output_columns().contains(column));
                assert!(!template.required_columns().contains(column));
            }
        }
    }

    #[test]
    fn test_cell_number() {
        assert_eq!(cell_number(&json!(100)), Ok(Some(100.0)));
        assert_eq!(cell_number(&json!(" 1,250.5 ")), Ok(Some(1250.5)));
        assert_eq!(cell_number(&Value::Null), Ok(None));
        assert_eq!(cell_number(&json!("  ")), Ok(None));
        assert_eq!(cell_number(&json!("n/a")), Err("n/a".to_string()));
    }

    #[test]
    fn test_number_value_prefers_integers() {
        assert_eq!(number_value(150.0), json!(150));
        assert_eq!(number_value(12.5), json!(12.5));
        assert_eq!(number_value(f64::NAN), Value::Null);
    }

    #[test]
    fn test_dashboard_metrics() {
        let table = Table::with_rows(
            ["學生編號", "老師"],
            vec![
                vec![json!("S1"), json!("T1")],
                vec![json!("S1"), json!("T2")],
                vec![json!("S2"), Value::Null],
            ],
        );
        let metrics = DashboardMetrics::from_table(&table);

        assert_eq!(metrics.total_students, Some(2));
        assert_eq!(metrics.total_teachers, Some(2));
        assert_eq!(metrics.total_grades, None);
    }

    #[test]
    fn test_to_records() {
        let table = Table::with_rows(["老師", "學生人數"], vec![vec![json!("T1"), json!(3)]]);
        let records = table.to_records();
        assert_eq!(records[0]["老師"], "T1");
        assert_eq!(records[0]["學生人數"], 3);
    }
}
