//! REST API types for the upload page.
//!
//! Rows are sent as JSON objects keyed by column name; `columns` keeps the
//! report's column order for display.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{DashboardMetrics, Template};
use crate::transform::pipeline::ReportOutput;

/// Response to a report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready", or "empty" when the report has no rows
    pub status: String,

    /// Template label
    pub template: String,

    /// `YYYY-MM`, empty when unknown
    pub period: String,

    /// Suggested download name
    pub filename: String,

    pub columns: Vec<String>,

    pub rows: Vec<Value>,

    pub metrics: DashboardMetrics,
}

impl From<ReportOutput> for ReportResponse {
    fn from(output: ReportOutput) -> Self {
        let report = output.report;
        let status = if report.table.is_empty() { "empty" } else { "ready" };

        ReportResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            template: report.template.label().to_string(),
            filename: report.file_name(),
            rows: report.table.to_records(),
            columns: report.table.columns,
            period: report.period,
            metrics: output.metrics,
        }
    }
}

/// One entry of `GET /api/templates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub label: String,
    pub slug: String,
    pub required_columns: Vec<String>,
    /// Used when present, left out of the output when absent
    pub optional_columns: Vec<String>,
    pub output_columns: Vec<String>,
    /// Whether the report carries the 月份 column
    pub uses_period: bool,
}

impl From<Template> for TemplateInfo {
    fn from(template: Template) -> Self {
        let owned = |cols: &[&str]| cols.iter().map(|c| c.to_string()).collect();
        TemplateInfo {
            label: template.label().to_string(),
            slug: template.slug().to_string(),
            required_columns: owned(template.required_columns()),
            optional_columns: owned(template.optional_columns()),
            output_columns: owned(template.output_columns()),
            uses_period: template.uses_period(),
        }
    }
}

/// All templates in display order.
pub fn template_list() -> Vec<TemplateInfo> {
    Template::ALL.into_iter().map(TemplateInfo::from).collect()
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "columns": [],
        "rows": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Report, Table};

    #[test]
    fn test_response_from_output() {
        let table = Table::with_rows(
            ["老師", "月份", "學生人數", "本月總收入"],
            vec![vec![json!("Amy"), json!("2024-05"), json!(2), json!(240)]],
        );
        let output = ReportOutput {
            report: Report {
                template: Template::TeacherSummary,
                period: "2024-05".into(),
                table,
            },
            csv: Vec::new(),
            source: crate::transform::pipeline::SourceInfo {
                format: crate::parser::SourceFormat::Csv,
                sheet: None,
                encoding: Some("utf-8".into()),
                delimiter: Some(','),
                headers: vec![],
                row_count: 2,
                repaired_headers: vec![],
            },
            metrics: DashboardMetrics::default(),
        };

        let response = ReportResponse::from(output);
        assert_eq!(response.status, "ready");
        assert_eq!(response.filename, "老師月統計.csv");
        assert_eq!(response.rows[0]["本月總收入"], 240);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("jobId").is_some());
        assert_eq!(json["columns"][0], "老師");
    }

    #[test]
    fn test_template_list() {
        let list = template_list();
        assert_eq!(list.len(), 4);
        assert_eq!(list[3].label, "課文詞語墳充家長");
        assert_eq!(list[3].required_columns, vec!["學校", "年級"]);
        assert_eq!(list[3].optional_columns, vec!["學生編號", "學生姓名", "家長電郵"]);
        assert!(!list[3].uses_period);
        assert!(list[0].uses_period);

        let json = serde_json::to_value(&list[2]).unwrap();
        assert_eq!(json["optionalColumns"], json!([]));
        assert_eq!(json["usesPeriod"], false);
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("Missing column");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Missing column");
        assert_eq!(body["rows"], json!([]));
    }
}
