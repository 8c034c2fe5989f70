//! # Jupiter Reports - tutoring attendance and billing reports
//!
//! Turns the attendance/billing export of the JollyJupiter tutoring system
//! (an `.xlsx`/`.xls` workbook, or the same sheet saved as CSV) into one of
//! four report tables, downloadable as UTF-8 CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Upload    │────▶│   Parser    │────▶│  Transform  │────▶│  CSV (BOM)  │
//! │ (xlsx/csv)  │     │ (row 6 hdr) │     │ (template)  │     │   / JSON    │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jupiter_reports::{run_file, IngestOptions, Template};
//! use std::path::Path;
//!
//! let output = run_file(Path::new("may.xlsx"), Template::BillingRoster, &IngestOptions::default())?;
//! println!("{} classes", output.report.table.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Sheet layout and server settings
//! - [`models`] - Table, templates, column names
//! - [`parser`] - Workbook/CSV ingestion and period lookup
//! - [`normalize`] - School names, grade labels, header repairs
//! - [`validation`] - Template column contracts
//! - [`transform`] - The four report transformers and the pipeline
//! - [`export`] - CSV output
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Cleaning
pub mod normalize;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod export;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors and config
// =============================================================================

pub use config::{IngestOptions, ServerConfig};
pub use error::{ExportError, PipelineError, ReportError, ServerError, WorkbookError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{columns, DashboardMetrics, Report, Table, Template};

// =============================================================================
// Re-exports - Parsing and cleaning
// =============================================================================

pub use normalize::{normalize_school_name, repair_headers, translate_grade};
pub use parser::{extract_period, parse_bytes_auto, parse_file_auto, ParseResult, SourceFormat};

// =============================================================================
// Re-exports - Transformers and pipeline
// =============================================================================

pub use transform::{
    attendance_detail, billing_roster, generate, parent_contacts, teacher_summary,
};
pub use transform::pipeline::{
    generate_report, ingest_bytes, ingest_file, run_bytes, run_file, ReportOutput, SourceInfo,
    Upload,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ReportResponse, TemplateInfo};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
