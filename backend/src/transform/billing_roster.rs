//! 下個月預算老師清單（不看出席）: expected and unpaid students per class.
//!
//! Attendance is ignored: every row of the upload counts. A class is the
//! (school, grade, teacher) triple after school names are cleaned and P1–P6
//! grades translated. A student is unpaid in a class when any of their rows
//! in that class shows a balance above zero.

use serde_json::Value;

use super::amount;
use super::grouper::{group_rows, key_text, Distinct};
use crate::error::ReportError;
use crate::models::{columns, Table, Template};
use crate::normalize::{normalize_school_name, translate_grade};

/// Build the next-month billing roster.
///
/// Output columns: 學校, 年級, 預計學生人數, 未交費學生人數, 老師, 老師電郵.
/// 老師電郵 is left empty for the office to fill in.
pub fn billing_roster(table: &Table) -> Result<Table, ReportError> {
    let template = Template::BillingRoster;
    let school = table.require(columns::SCHOOL, template)?;
    let grade = table.require(columns::GRADE, template)?;
    let teacher = table.require(columns::TEACHER, template)?;
    let student = table.require(columns::STUDENT_ID, template)?;
    let balance = table.require(columns::BALANCE, template)?;

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| (i + 1, row.as_slice()));

    // Empty schools still form a class; empty grades or teachers do not.
    let groups = group_rows(rows, |row| {
        let grade_code = key_text(&row[grade])?;
        let teacher_name = key_text(&row[teacher])?;
        Some(ClassKey {
            school: normalize_school_name(&row[school]),
            grade: translate_grade(&grade_code),
            teacher: teacher_name,
        })
    });

    let mut result = Table::new(template.output_columns().iter().copied());
    for (key, rows) in groups {
        let mut class = ClassRoster::default();
        for (line, row) in rows {
            class.expected.insert(&row[student]);
            if amount(line, &row[balance], columns::BALANCE)? > 0.0 {
                class.unpaid.insert(&row[student]);
            }
        }
        result.push_row(class.build(key));
    }
    Ok(result)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClassKey {
    school: String,
    grade: String,
    teacher: String,
}

#[derive(Default)]
struct ClassRoster {
    expected: Distinct,
    unpaid: Distinct,
}

impl ClassRoster {
    fn build(self, key: ClassKey) -> Vec<Value> {
        vec![
            Value::String(key.school),
            Value::String(key.grade),
            Value::from(self.expected.len()),
            Value::from(self.unpaid.len()),
            Value::String(key.teacher),
            Value::String(String::new()),
        ]
    }
}
