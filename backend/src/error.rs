//! Error types for the report pipeline.
//!
//! - [`WorkbookError`] - the upload cannot be read as a spreadsheet or CSV
//! - [`ReportError`] - a template cannot be produced from the ingested table
//! - [`ExportError`] - CSV serialization of a finished report
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Conversion is automatic via `From`, so `?` works across boundaries.
//! Period extraction has no error type: it degrades to an empty label.

use thiserror::Error;

// =============================================================================
// Workbook Errors
// =============================================================================

/// Errors while reading the uploaded file.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The bytes are not a workbook calamine understands.
    #[error("Cannot open spreadsheet: {0}")]
    OpenError(String),

    /// The workbook has no sheet to read.
    #[error("Spreadsheet has no worksheets")]
    NoWorksheet,

    /// The sheet is shorter than the fixed header offset.
    #[error("Header row {row} not found (file has only {available} rows)")]
    MissingHeaderRow { row: usize, available: usize },

    /// Invalid CSV content.
    #[error("Invalid CSV at line {line}: {message}")]
    CsvError { line: usize, message: String },

    /// File is empty.
    #[error("File is empty")]
    EmptyFile,
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while producing a report from an ingested table.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A column the selected template needs is absent.
    #[error("Missing column '{column}' required by template '{template}'")]
    MissingColumn { column: String, template: String },

    /// A fee or balance cell holds text that is not a number.
    #[error("Column '{column}', data row {row}: '{value}' is not a number")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    /// Template identifier does not name one of the four reports.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while writing a report out as CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV write error: {0}")]
    CsvError(#[from] csv::Error),

    /// IO error.
    #[error("Export IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// Returned by [`crate::transform::pipeline::run_bytes`] and friends.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upload could not be read.
    #[error("File error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Report could not be produced.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    /// Report could not be exported.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

impl PipelineError {
    /// True when the upload itself is fine and another template may succeed.
    pub fn is_retryable_with_other_template(&self) -> bool {
        matches!(self, PipelineError::Report(_))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workbook ingestion.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Result type for report generation.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for CSV export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // WorkbookError -> PipelineError
        let err: PipelineError = WorkbookError::EmptyFile.into();
        assert!(err.to_string().contains("empty"));
        assert!(!err.is_retryable_with_other_template());

        // ReportError -> PipelineError
        let err: PipelineError = ReportError::UnknownTemplate("月報".into()).into();
        assert!(err.to_string().contains("月報"));
        assert!(err.is_retryable_with_other_template());
    }

    #[test]
    fn test_missing_column_names_column_and_template() {
        let err = ReportError::MissingColumn {
            column: "欠數總額".into(),
            template: "下個月預算老師清單（不看出席）".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("欠數總額"));
        assert!(msg.contains("下個月預算老師清單（不看出席）"));
    }

    #[test]
    fn test_header_row_error_format() {
        let err = WorkbookError::MissingHeaderRow { row: 5, available: 3 };
        let msg = err.to_string();
        assert!(msg.contains("5"));
        assert!(msg.contains("3"));
    }
}
