//! 學生出席明細: one row per attended session, in upload order.

use serde_json::Value;

use super::present_rows;
use crate::error::ReportError;
use crate::models::{columns, Table, Template};

/// Build the student attendance detail.
///
/// Output columns: 學生姓名, 老師, 上課日期, 單堂收費, 月份.
pub fn attendance_detail(table: &Table, period: &str) -> Result<Table, ReportError> {
    let template = Template::AttendanceDetail;
    let status = table.require(columns::ATTENDANCE, template)?;
    let projection = [
        table.require(columns::STUDENT_NAME, template)?,
        table.require(columns::TEACHER, template)?,
        table.require(columns::CLASS_DATE, template)?,
        table.require(columns::FEE, template)?,
    ];

    let mut result = Table::new(template.output_columns().iter().copied());
    for (_, row) in present_rows(table, status) {
        let mut cells: Vec<Value> = projection.iter().map(|&idx| row[idx].clone()).collect();
        cells.push(Value::String(period.to_string()));
        result.push_row(cells);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        Table::with_rows(
            ["上課日期", "老師", "學生姓名", "學生出席狀況", "單堂收費", "學校"],
            vec![
                vec![json!("2024-05-02"), json!("Amy"), json!("陳大文"), json!("出席"), json!(120), json!("A")],
                vec![json!("2024-05-02"), json!("Amy"), json!("李小明"), json!("缺席"), json!(120), json!("A")],
                vec![json!("2024-05-09"), json!("Amy"), json!("陳大文"), json!("出席"), json!(120), json!("A")],
                vec![json!("2024-05-03"), json!("Ben"), json!("張三"), json!("出席"), json!(90), json!("B")],
            ],
        )
    }

    #[test]
    fn test_one_row_per_present_session() {
        let result = attendance_detail(&sample(), "2024-05").unwrap();

        assert_eq!(result.columns, vec!["學生姓名", "老師", "上課日期", "單堂收費", "月份"]);
        assert_eq!(result.len(), 3);
        assert_eq!(
            result.rows[0],
            vec![json!("陳大文"), json!("Amy"), json!("2024-05-02"), json!(120), json!("2024-05")]
        );
    }

    #[test]
    fn test_row_order_preserved() {
        let result = attendance_detail(&sample(), "2024-05").unwrap();
        let dates: Vec<&Value> = result.rows.iter().map(|r| &r[2]).collect();
        assert_eq!(dates, vec![&json!("2024-05-02"), &json!("2024-05-09"), &json!("2024-05-03")]);
    }

    #[test]
    fn test_input_untouched() {
        let table = sample();
        let before = table.clone();
        attendance_detail(&table, "2024-05").unwrap();
        assert_eq!(table, before);
    }

    #[test]
    fn test_empty_input() {
        let table = Table::new(["學生出席狀況", "學生姓名", "老師", "上課日期", "單堂收費"]);
        let result = attendance_detail(&table, "").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns.len(), 5);
    }

    #[test]
    fn test_missing_class_date() {
        let table = Table::new(["學生出席狀況", "學生姓名", "老師", "單堂收費"]);
        let err = attendance_detail(&table, "").unwrap_err();
        assert!(err.to_string().contains("上課日期"));
        assert!(err.to_string().contains("學生出席明細"));
    }
}
