//! 老師月統計: per-teacher student count and revenue for the period.
//!
//! Only rows marked present count. Teachers without any present row in the
//! upload do not appear.

use serde_json::Value;

use super::grouper::{group_rows, key_text, Distinct};
use super::{amount, present_rows};
use crate::error::ReportError;
use crate::models::{columns, number_value, Table, Template};

/// Build the teacher monthly summary.
///
/// Output columns: 老師, 月份, 學生人數, 本月總收入.
pub fn teacher_summary(table: &Table, period: &str) -> Result<Table, ReportError> {
    let template = Template::TeacherSummary;
    let status = table.require(columns::ATTENDANCE, template)?;
    let student = table.require(columns::STUDENT_NAME, template)?;
    let teacher = table.require(columns::TEACHER, template)?;
    let fee = table.require(columns::FEE, template)?;

    // The period is constant, so grouping by teacher alone yields the same
    // groups as grouping by (teacher, period).
    let groups = group_rows(present_rows(table, status), |row| key_text(&row[teacher]));

    let mut result = Table::new(template.output_columns().iter().copied());
    for (name, rows) in groups {
        let mut totals = TeacherTotals::default();
        for (line, row) in rows {
            totals.students.insert(&row[student]);
            totals.revenue += amount(line, &row[fee], columns::FEE)?;
        }
        result.push_row(totals.build(name, period));
    }
    Ok(result)
}

/// One teacher's students and fees.
#[derive(Default)]
struct TeacherTotals {
    students: Distinct,
    revenue: f64,
}

impl TeacherTotals {
    fn build(self, teacher: String, period: &str) -> Vec<Value> {
        vec![
            Value::String(teacher),
            Value::String(period.to_string()),
            Value::from(self.students.len()),
            number_value(self.revenue),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers() -> [&'static str; 4] {
        ["老師", "學生出席狀況", "學生姓名", "單堂收費"]
    }

    #[test]
    fn test_absent_rows_ignored() {
        let table = Table::with_rows(
            headers(),
            vec![
                vec![json!("T1"), json!("出席"), json!("S1"), json!(100)],
                vec![json!("T1"), json!("缺席"), json!("S2"), json!(50)],
            ],
        );
        let result = teacher_summary(&table, "2024-05").unwrap();

        assert_eq!(result.columns, vec!["老師", "月份", "學生人數", "本月總收入"]);
        assert_eq!(result.rows, vec![vec![json!("T1"), json!("2024-05"), json!(1), json!(100)]]);
    }

    #[test]
    fn test_distinct_students_and_fee_sum() {
        let table = Table::with_rows(
            headers(),
            vec![
                vec![json!("Amy"), json!("出席"), json!("陳大文"), json!(120)],
                vec![json!("Ben"), json!("出席"), json!("李小明"), json!("80")],
                vec![json!("Amy"), json!("出席"), json!("陳大文"), json!(120.5)],
                vec![json!("Amy"), json!("出席"), json!("張三"), Value::Null],
            ],
        );
        let result = teacher_summary(&table, "2024-05").unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[0], vec![json!("Amy"), json!("2024-05"), json!(2), json!(240.5)]);
        assert_eq!(result.rows[1], vec![json!("Ben"), json!("2024-05"), json!(1), json!(80)]);
    }

    #[test]
    fn test_teacher_without_present_rows_absent() {
        let table = Table::with_rows(
            headers(),
            vec![
                vec![json!("Amy"), json!("出席"), json!("S1"), json!(100)],
                vec![json!("Ben"), json!("請假"), json!("S2"), json!(100)],
            ],
        );
        let result = teacher_summary(&table, "").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows[0][0], json!("Amy"));
        assert_eq!(result.rows[0][1], json!(""));
    }

    #[test]
    fn test_no_present_rows_gives_headers_only() {
        let table = Table::with_rows(
            headers(),
            vec![vec![json!("Amy"), json!("缺席"), json!("S1"), json!(100)]],
        );
        let result = teacher_summary(&table, "2024-05").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns.len(), 4);
    }

    #[test]
    fn test_bad_fee_reports_row() {
        let table = Table::with_rows(
            headers(),
            vec![
                vec![json!("Amy"), json!("出席"), json!("S1"), json!(100)],
                vec![json!("Amy"), json!("出席"), json!("S2"), json!("免費")],
            ],
        );
        match teacher_summary(&table, "2024-05").unwrap_err() {
            ReportError::InvalidNumber { column, row, value } => {
                assert_eq!(column, "單堂收費");
                assert_eq!(row, 2);
                assert_eq!(value, "免費");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_fee_column() {
        let table = Table::new(["老師", "學生出席狀況", "學生姓名"]);
        let err = teacher_summary(&table, "2024-05").unwrap_err();
        assert!(err.to_string().contains("單堂收費"));
    }
}
