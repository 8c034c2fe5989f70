//! Column contracts for the report templates.
//!
//! Each [`Template`] declares the columns it cannot run without. The
//! contract is checked before any row is touched so a bad upload fails with
//! the name of the missing column instead of halfway through a report.
//!
//! # Example
//!
//! ```rust,ignore
//! use jupiter_reports::{check_columns, Table, Template};
//!
//! let table = Table::new(["老師", "學生姓名"]);
//! let err = check_columns(&table, Template::TeacherSummary).unwrap_err();
//! assert!(err.to_string().contains("學生出席狀況"));
//! ```

use crate::error::ReportError;
use crate::models::{Table, Template};

/// Fail on the first required column the table lacks.
pub fn check_columns(table: &Table, template: Template) -> Result<(), ReportError> {
    for column in template.required_columns() {
        table.require(column, template)?;
    }
    Ok(())
}

/// All required columns the table lacks, in contract order.
pub fn missing_columns(table: &Table, template: Template) -> Vec<&'static str> {
    template
        .required_columns()
        .iter()
        .copied()
        .filter(|c| !table.has_column(c))
        .collect()
}

/// Templates whose contract the table satisfies.
pub fn available_templates(table: &Table) -> Vec<Template> {
    Template::ALL
        .into_iter()
        .filter(|t| missing_columns(table, *t).is_empty())
        .collect()
}
