//! HTTP server for the report backend.
//!
//! Provides REST endpoints for upload and report generation.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | GET    | `/api/templates`  | List report templates                |
//! | POST   | `/api/report`     | Upload sheet, get report as JSON     |
//! | POST   | `/api/report/csv` | Upload sheet, download report CSV    |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, template_list, ReportResponse, TemplateInfo};
use crate::config::{IngestOptions, ServerConfig};
use crate::error::{PipelineError, ReportError, ServerError};
use crate::export::CSV_CONTENT_TYPE;
use crate::models::Template;
use crate::transform::pipeline::{run_bytes, ReportOutput};

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/templates", get(templates))
        .route("/api/report", post(report_json))
        .route("/api/report/csv", post(report_csv))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Report server running on http://localhost:{}", config.port);
    println!("   GET  /api/templates   - List templates");
    println!("   POST /api/report      - Upload sheet, JSON report");
    println!("   POST /api/report/csv  - Upload sheet, CSV download");
    println!("   GET  /api/logs        - SSE log stream");
    println!("   GET  /health          - Health check");
    println!("   Upload limit: {} MB", config.max_upload_bytes / (1024 * 1024));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(PipelineError::Report(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(PipelineError::Workbook(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ServerError::Pipeline(e) => e.to_string(),
            ServerError::BadRequest(msg) | ServerError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        eprintln!("❌ {}", self);
        (self.status(), Json(error_response(&self.message()))).into_response()
    }
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "jupiter-reports",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "templates": "GET /api/templates",
            "report": "POST /api/report",
            "reportCsv": "POST /api/report/csv",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn templates() -> Json<Vec<TemplateInfo>> {
    Json(template_list())
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Report as JSON rows
async fn report_json(multipart: Multipart) -> Result<Json<ReportResponse>, ServerError> {
    let output = process_upload(multipart).await?;
    Ok(Json(ReportResponse::from(output)))
}

/// Report as a CSV download
async fn report_csv(multipart: Multipart) -> Result<Response, ServerError> {
    let output = process_upload(multipart).await?;
    let headers = [
        (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(output.report.template),
        ),
    ];
    Ok((headers, output.csv).into_response())
}

/// Fields of the upload form.
struct UploadForm {
    bytes: Vec<u8>,
    file_name: Option<String>,
    template: Template,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, ServerError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut template: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(data.to_vec());
            }
            "template" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                template = Some(text);
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let template = template.ok_or_else(|| ServerError::BadRequest("No template provided".into()))?;
    let template = template
        .parse::<Template>()
        .map_err(|e: ReportError| ServerError::Pipeline(e.into()))?;

    Ok(UploadForm {
        bytes,
        file_name,
        template,
    })
}

async fn process_upload(multipart: Multipart) -> Result<ReportOutput, ServerError> {
    let form = read_form(multipart).await?;

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes) → {}",
        form.file_name.as_deref().unwrap_or("unknown"),
        form.bytes.len(),
        form.template
    );
    println!("{}\n", "=".repeat(70));

    let UploadForm {
        bytes,
        file_name,
        template,
    } = form;
    let output = tokio::task::spawn_blocking(move || {
        run_bytes(&bytes, file_name.as_deref(), template, &IngestOptions::default())
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Report task failed: {}", e)))??;

    println!("\n{}", "=".repeat(70));
    println!("📊 SUMMARY");
    println!("{}", "=".repeat(70));
    println!("   Template:       {}", output.report.template);
    println!("   Period:         {}", output.report.period);
    println!("   Input rows:     {}", output.source.row_count);
    println!("   Report rows:    {}", output.report.table.len());
    println!("{}\n", "=".repeat(70));

    Ok(output)
}

/// `attachment` header with an ASCII fallback name and the UTF-8 label.
fn content_disposition(template: Template) -> String {
    let encoded = utf8_percent_encode(&template.file_name(), NON_ALPHANUMERIC).to_string();
    format!(
        "attachment; filename=\"{}.csv\"; filename*=UTF-8''{}",
        template.slug(),
        encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkbookError;

    #[test]
    fn test_status_mapping() {
        let missing = ServerError::from(PipelineError::from(ReportError::MissingColumn {
            column: "學校".into(),
            template: "課文詞語墳充家長".into(),
        }));
        assert_eq!(missing.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let unknown = ServerError::from(PipelineError::from(ReportError::UnknownTemplate("x".into())));
        assert_eq!(unknown.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let unreadable = ServerError::from(PipelineError::from(WorkbookError::EmptyFile));
        assert_eq!(unreadable.status(), StatusCode::BAD_REQUEST);

        assert_eq!(
            ServerError::BadRequest("No file provided".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_message_is_not_double_prefixed() {
        let err = ServerError::BadRequest("No file provided".into());
        assert_eq!(err.message(), "No file provided");
    }

    #[test]
    fn test_content_disposition() {
        let value = content_disposition(Template::TeacherSummary);
        assert!(value.starts_with("attachment; filename=\"teacher-summary.csv\"; filename*=UTF-8''"));
        assert!(value.ends_with("%2Ecsv"));
        assert!(value.contains("%E8%80%81")); // 老
    }
}
