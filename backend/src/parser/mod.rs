//! Upload ingestion: workbook or CSV bytes to a [`Table`] plus period.
//!
//! The attendance export has a small metadata block on top (rows 0–4, one
//! of which holds the reporting period), column headers on row 5 and data
//! below. Workbooks are read with calamine; CSV exports of the same sheet
//! go through encoding and delimiter auto-detection first.

pub mod period;
pub mod workbook;

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::config::IngestOptions;
use crate::error::WorkbookError;
use crate::models::{cell_text, is_blank, Table};
pub use period::extract_period;
pub use workbook::{read_first_sheet, SheetGrid};

/// Kind of file an upload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Workbook,
    Csv,
}

impl SourceFormat {
    /// Decide from the file name when it has a known extension, otherwise
    /// from the leading bytes (zip or OLE2 container means workbook).
    pub fn detect(file_name: Option<&str>, bytes: &[u8]) -> Self {
        let extension = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") | Some("txt") => return SourceFormat::Csv,
            Some("xls") | Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("ods") => {
                return SourceFormat::Workbook
            }
            _ => {}
        }

        const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
        const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
            return SourceFormat::Workbook;
        }
        let head = &bytes[..bytes.len().min(1024)];
        if head.contains(&0) {
            SourceFormat::Workbook
        } else {
            SourceFormat::Csv
        }
    }
}

/// Result of ingesting an upload.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Data block, headers from the header row.
    pub table: Table,
    /// Period label, `None` when it could not be found.
    pub period: Option<String>,
    pub format: SourceFormat,
    /// Sheet read (workbooks only).
    pub sheet: Option<String>,
    /// Detected encoding (CSV only).
    pub encoding: Option<String>,
    /// Detected delimiter (CSV only).
    pub delimiter: Option<char>,
}

/// Read a file from disk, detecting its format.
pub fn parse_file_auto<P: AsRef<Path>>(
    path: P,
    options: &IngestOptions,
) -> Result<ParseResult, WorkbookError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let file_name = path.file_name().and_then(|n| n.to_str());
    parse_bytes_auto(&bytes, file_name, options)
}

/// Ingest uploaded bytes. `file_name` only helps format detection.
pub fn parse_bytes_auto(
    bytes: &[u8],
    file_name: Option<&str>,
    options: &IngestOptions,
) -> Result<ParseResult, WorkbookError> {
    if bytes.is_empty() {
        return Err(WorkbookError::EmptyFile);
    }

    let format = SourceFormat::detect(file_name, bytes);
    let (grid, sheet, encoding, delimiter) = match format {
        SourceFormat::Workbook => {
            let grid = read_first_sheet(bytes)?;
            (grid.rows, Some(grid.sheet), None, None)
        }
        SourceFormat::Csv => {
            let encoding = detect_encoding(bytes);
            let content = decode_content(bytes, &encoding);
            let delimiter = detect_delimiter(&content);
            let rows = parse_csv_grid(&content, delimiter)?;
            (rows, None, Some(encoding), Some(delimiter))
        }
    };

    let period = extract_period(&grid, options);
    let table = grid_to_table(&grid, options.header_row)?;

    Ok(ParseResult {
        table,
        period,
        format,
        sheet,
        encoding,
        delimiter,
    })
}

/// Build the data table from a sheet grid with headers on `header_row`.
///
/// Blank header cells are named `column_<n>` (1-based); repeated names get
/// `.1`, `.2` suffixes. Rows with no content are skipped.
pub fn grid_to_table(grid: &[Vec<Value>], header_row: usize) -> Result<Table, WorkbookError> {
    let header = grid.get(header_row).ok_or(WorkbookError::MissingHeaderRow {
        row: header_row,
        available: grid.len(),
    })?;

    let mut table = Table::new(header_names(header));
    for row in &grid[header_row + 1..] {
        if row.iter().all(is_blank) {
            continue;
        }
        table.push_row(row.clone());
    }
    Ok(table)
}

fn header_names(header: &[Value]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell_text(cell).trim().to_string();
            let name = if name.is_empty() {
                format!("column_{}", i + 1)
            } else {
                name
            };
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name
            } else {
                format!("{}.{}", name, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

// =============================================================================
// CSV exports
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    // chardet misreads short CJK samples; valid UTF-8 wins outright.
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }
    let charset = chardet::detect(bytes).0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "big5" | "big5-hkscs" => "big5".to_string(),
        "gb2312" | "gbk" | "gb18030" => "gb18030".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with the given encoding label, dropping any BOM.
///
/// Unknown labels fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding_rs::Encoding::for_label(encoding.as_bytes()) {
        Some(enc) => enc.decode(bytes).0.into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    };
    decoded.trim_start_matches('\u{feff}').to_string()
}

/// Pick the separator that appears most on the busiest of the first lines.
///
/// The first lines of an export are metadata with few cells, so the header
/// line usually decides.
pub fn detect_delimiter(content: &str) -> char {
    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for line in content.lines().take(10) {
        for &sep in &separators {
            let count = line.matches(sep).count();
            if count > best_count {
                best_count = count;
                best_sep = sep;
            }
        }
    }

    best_sep
}

/// Parse CSV text into a grid of cells, no header handling.
pub fn parse_csv_grid(content: &str, delimiter: char) -> Result<Vec<Vec<Value>>, WorkbookError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| WorkbookError::CsvError {
            line: e.position().map(|p| p.line() as usize).unwrap_or(0),
            message: e.to_string(),
        })?;
        let cells = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Value::Null
                } else {
                    Value::String(field.to_string())
                }
            })
            .collect();
        rows.push(cells);
    }
    Ok(rows)
}
