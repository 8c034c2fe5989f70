//! 課文詞語墳充家長: de-duplicated parent contacts for P1–P6 students.
//!
//! Unlike the billing roster, grades outside P1–P6 are dropped rather than
//! passed through. Student ID, name and parent email are optional: the list
//! carries whichever of them the upload has.

use serde_json::Value;
use std::collections::HashSet;

use crate::error::ReportError;
use crate::models::{columns, Table, Template};
use crate::normalize::{grade_label, normalize_school_name};

/// One output column and where its value comes from.
enum Source {
    Copy(usize),
    School(usize),
    Grade,
}

/// Build the parent vocabulary-program contact list.
///
/// Output columns: 學生編號, 學生姓名, 學校, 年級, 家長電郵 (absent optional
/// columns omitted).
pub fn parent_contacts(table: &Table) -> Result<Table, ReportError> {
    let template = Template::ParentContacts;
    let school = table.require(columns::SCHOOL, template)?;
    let grade = table.require(columns::GRADE, template)?;

    let mut headers = Vec::new();
    let mut sources = Vec::new();
    for &name in template.output_columns() {
        let source = match name {
            columns::SCHOOL => Source::School(school),
            columns::GRADE => Source::Grade,
            optional if template.optional_columns().contains(&optional) => {
                match table.column_index(optional) {
                    Some(idx) => Source::Copy(idx),
                    None => continue,
                }
            }
            _ => continue,
        };
        headers.push(name);
        sources.push(source);
    }

    let mut result = Table::new(headers);
    let mut seen = HashSet::new();
    for row in &table.rows {
        let Some(label) = primary_grade(&row[grade]) else {
            continue;
        };
        let cells: Vec<Value> = sources
            .iter()
            .map(|source| match source {
                Source::Copy(idx) => row[*idx].clone(),
                Source::School(idx) => Value::String(normalize_school_name(&row[*idx])),
                Source::Grade => Value::String(label.to_string()),
            })
            .collect();

        // Value has no Hash; its JSON text is a faithful key.
        let key = serde_json::to_string(&cells).unwrap_or_else(|_| format!("{cells:?}"));
        if seen.insert(key) {
            result.push_row(cells);
        }
    }
    Ok(result)
}

/// Label for a grade cell holding exactly one of P1–P6.
fn primary_grade(value: &Value) -> Option<&'static str> {
    match value {
        Value::String(code) => grade_label(code),
        _ => None,
    }
}
