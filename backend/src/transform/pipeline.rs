//! High-level pipeline: upload bytes to a finished report.
//!
//! 1. Ingest the workbook or CSV (header on row 6, period from the top rows)
//! 2. Repair known header misspellings
//! 3. Check the template's column contract and run its transformer
//! 4. Export the result as UTF-8 CSV with a BOM
//!
//! Each call is independent: nothing is cached between uploads.
//!
//! # Example
//!
//! ```rust,ignore
//! use jupiter_reports::{run_file, IngestOptions, Template};
//! use std::path::Path;
//!
//! let output = run_file(Path::new("2024-05.xlsx"), Template::TeacherSummary, &IngestOptions::default())?;
//! std::fs::write(output.report.file_name(), &output.csv)?;
//! ```

use serde::Serialize;
use std::path::Path;

use super::generate;
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::config::IngestOptions;
use crate::error::PipelineError;
use crate::export::to_csv_bytes;
use crate::models::{DashboardMetrics, Report, Table, Template};
use crate::normalize::{pending_header_repairs, repair_headers};
use crate::parser::{parse_bytes_auto, ParseResult, SourceFormat};

/// Where the table came from and what it looked like.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub format: SourceFormat,
    pub sheet: Option<String>,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    /// Headers after repair
    pub headers: Vec<String>,
    pub row_count: usize,
    /// `(misspelled, canonical)` header renames applied
    pub repaired_headers: Vec<(String, String)>,
}

/// An ingested upload, ready for any template.
#[derive(Debug, Clone)]
pub struct Upload {
    pub table: Table,
    /// `YYYY-MM`, empty when the period could not be found
    pub period: String,
    pub source: SourceInfo,
    pub metrics: DashboardMetrics,
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub report: Report,
    /// CSV download, UTF-8 with BOM
    pub csv: Vec<u8>,
    pub source: SourceInfo,
    pub metrics: DashboardMetrics,
}

/// Ingest a file from disk.
pub fn ingest_file(path: &Path, options: &IngestOptions) -> Result<Upload, PipelineError> {
    let bytes = std::fs::read(path).map_err(crate::error::WorkbookError::from)?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    ingest_bytes(&bytes, file_name, options)
}

/// Ingest uploaded bytes: parse, find the period, repair headers.
///
/// A missing period is logged and replaced by an empty label; it never
/// fails the upload.
pub fn ingest_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &IngestOptions,
) -> Result<Upload, PipelineError> {
    log_info(format!(
        "📖 Reading {} ({} bytes)...",
        file_name.unwrap_or("upload"),
        bytes.len()
    ));

    let parsed = parse_bytes_auto(bytes, file_name, options).map_err(|e| {
        log_error(format!("Cannot read file: {}", e));
        e
    })?;

    Ok(finish_ingest(parsed))
}

fn finish_ingest(parsed: ParseResult) -> Upload {
    let ParseResult {
        table,
        period,
        format,
        sheet,
        encoding,
        delimiter,
    } = parsed;

    match (&sheet, &encoding) {
        (Some(sheet), _) => log_success(format!("Workbook sheet: {}", sheet)),
        (None, Some(encoding)) => log_success(format!(
            "CSV export, encoding {}, separator '{}'",
            encoding,
            format_delimiter(delimiter.unwrap_or(','))
        )),
        _ => {}
    }

    let repairs: Vec<(String, String)> = pending_header_repairs(&table)
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
    for (from, to) in &repairs {
        log_warning(format!("Header '{}' renamed to '{}'", from, to));
    }
    let table = repair_headers(table);

    log_success(format!("Read {} rows", table.len()));
    log_info(format!("📋 {} columns:", table.columns.len()));
    for (i, col) in table.columns.iter().enumerate() {
        log_info_indent(format!("[{:2}] {}", i + 1, col), 1);
    }

    let period = match period {
        Some(period) => {
            log_success(format!("Period: {}", period));
            period
        }
        None => {
            log_warning("No period found in the header block, continuing without one");
            String::new()
        }
    };

    let metrics = DashboardMetrics::from_table(&table);
    let source = SourceInfo {
        format,
        sheet,
        encoding,
        delimiter,
        headers: table.columns.clone(),
        row_count: table.len(),
        repaired_headers: repairs,
    };

    Upload {
        table,
        period,
        source,
        metrics,
    }
}

/// Run one template over an ingested upload.
///
/// The upload is only borrowed, so a failed template can be retried with
/// another one.
pub fn generate_report(upload: &Upload, template: Template) -> Result<Report, PipelineError> {
    log_info(format!("⚙️  Generating {}...", template));
    if template.uses_period() && upload.period.is_empty() {
        log_warning(format!("{} will have an empty 月份 column", template));
    }
    let report = generate(&upload.table, template, &upload.period).map_err(|e| {
        log_error(e.to_string());
        e
    })?;
    log_success(format!("{} rows in {}", report.table.len(), template));
    Ok(report)
}

/// Ingest, generate and export in one go.
pub fn run_bytes(
    bytes: &[u8],
    file_name: Option<&str>,
    template: Template,
    options: &IngestOptions,
) -> Result<ReportOutput, PipelineError> {
    let upload = ingest_bytes(bytes, file_name, options)?;
    render(upload, template)
}

/// [`run_bytes`] for a file on disk.
pub fn run_file(
    path: &Path,
    template: Template,
    options: &IngestOptions,
) -> Result<ReportOutput, PipelineError> {
    let upload = ingest_file(path, options)?;
    render(upload, template)
}

fn render(upload: Upload, template: Template) -> Result<ReportOutput, PipelineError> {
    let report = generate_report(&upload, template)?;
    let csv = to_csv_bytes(&report.table)?;
    log_success(format!("💾 {} ({} bytes)", report.file_name(), csv.len()));

    Ok(ReportOutput {
        report,
        csv,
        source: upload.source,
        metrics: upload.metrics,
    })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}
