//! Report transformation.
//!
//! - Four independent transformers, one per [`Template`]
//! - Grouper: first-seen-order group-by shared by the aggregating reports
//! - Pipeline: bytes in, report and CSV out
//!
//! Transformers borrow the ingested table and build a new one; the input
//! is never modified.

pub mod attendance_detail;
pub mod billing_roster;
pub mod grouper;
pub mod parent_contacts;
pub mod pipeline;
pub mod teacher_summary;

pub use attendance_detail::attendance_detail;
pub use billing_roster::billing_roster;
pub use parent_contacts::parent_contacts;
pub use pipeline::*;
pub use teacher_summary::teacher_summary;

use serde_json::Value;

use crate::error::ReportError;
use crate::models::{cell_number, Report, Table, Template, PRESENT};
use crate::validation::check_columns;
use grouper::NumberedRow;

/// Run the transformer selected by `template`.
///
/// The column contract is checked first; `period` is only used by the
/// templates that carry it.
pub fn generate(table: &Table, template: Template, period: &str) -> Result<Report, ReportError> {
    check_columns(table, template)?;

    let result = match template {
        Template::TeacherSummary => teacher_summary(table, period)?,
        Template::AttendanceDetail => attendance_detail(table, period)?,
        Template::BillingRoster => billing_roster(table)?,
        Template::ParentContacts => parent_contacts(table)?,
    };

    Ok(Report {
        template,
        period: period.to_string(),
        table: result,
    })
}

/// Rows whose attendance status is exactly [`PRESENT`].
pub(crate) fn present_rows(table: &Table, status: usize) -> impl Iterator<Item = NumberedRow<'_>> {
    table
        .rows
        .iter()
        .enumerate()
        .filter(move |(_, row)| matches!(&row[status], Value::String(s) if s == PRESENT))
        .map(|(i, row)| (i + 1, row.as_slice()))
}

/// Money amount of a cell; blank counts as zero.
pub(crate) fn amount(line: usize, value: &Value, column: &str) -> Result<f64, ReportError> {
    cell_number(value)
        .map(|n| n.unwrap_or(0.0))
        .map_err(|text| ReportError::InvalidNumber {
            column: column.to_string(),
            row: line,
            value: text,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upload() -> Table {
        Table::with_rows(
            [
                "學校", "年級", "老師", "學生編號", "學生姓名", "學生出席狀況",
                "上課日期", "單堂收費", "欠數總額", "家長電郵",
            ],
            vec![
                vec![
                    json!("_A1_Foo"), json!("P3"), json!("Amy"), json!("S1"), json!("陳大文"),
                    json!("出席"), json!("2024-05-02"), json!(120), json!(0), json!("a@x.hk"),
                ],
                vec![
                    json!("_A1_Foo"), json!("P3"), json!("Amy"), json!("S2"), json!("李小明"),
                    json!("缺席"), json!("2024-05-02"), json!(120), json!(240), json!("b@x.hk"),
                ],
            ],
        )
    }

    #[test]
    fn test_generate_dispatches_every_template() {
        let table = upload();
        for template in Template::ALL {
            let report = generate(&table, template, "2024-05").unwrap();
            assert_eq!(report.template, template);
            assert_eq!(report.table.columns, template.output_columns());
        }
    }

    #[test]
    fn test_generate_checks_contract_first() {
        let table = Table::new(["老師"]);
        let err = generate(&table, Template::AttendanceDetail, "2024-05").unwrap_err();
        assert!(err.to_string().contains("學生出席狀況"));
    }

    #[test]
    fn test_empty_upload_yields_headers_for_every_template() {
        let table = Table::new(upload().columns);
        for template in Template::ALL {
            let report = generate(&table, template, "").unwrap();
            assert!(report.table.is_empty());
            assert_eq!(report.table.columns, template.output_columns());
        }
    }

    #[test]
    fn test_present_rows_exact_match() {
        let table = Table::with_rows(
            ["學生出席狀況"],
            vec![vec![json!("出席")], vec![json!(" 出席")], vec![json!("缺席")], vec![json!("出席")]],
        );
        let lines: Vec<usize> = present_rows(&table, 0).map(|(line, _)| line).collect();
        assert_eq!(lines, vec![1, 4]);
    }

    #[test]
    fn test_amount_blank_is_zero() {
        assert_eq!(amount(1, &Value::Null, "單堂收費").unwrap(), 0.0);
        assert!(amount(3, &json!("abc"), "單堂收費").is_err());
    }
}
