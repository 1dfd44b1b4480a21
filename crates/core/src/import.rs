//! Spreadsheet import of parts (CSV or XLSX).
//!
//! The file is read into header-keyed rows, checked for the required columns
//! and then each row is parsed into a [`PartImportRow`]. Database work
//! (group creation, upserts) happens in `cmms-db`; this module only
//! decides what each row means.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::CoreError;
use crate::types::Date;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of row errors returned in a report.
pub const MAX_REPORTED_ERRORS: usize = 10;

/// `min_stock` given to new parts when the sheet has no low-stock column.
pub const IMPORT_DEFAULT_MIN_STOCK: i32 = 10;

/// Maximum length of an auto-generated item-group code.
pub const GROUP_CODE_MAX_LEN: usize = 10;

/// Spreadsheet row numbers start at 2 (row 1 is the header).
const FIRST_DATA_ROW: usize = 2;

// Accepted header names for each logical column.
const COL_ITEM_NUMBER: &[&str] = &["item_number", "numero_item"];
const COL_DESCRIPTION: &[&str] = &["item_description", "descricao_item"];
const COL_GROUP: &[&str] = &["item_group", "grupo_itens"];
const COL_UNIT: &[&str] = &[
    "stock_unit",
    "unit_of_measure",
    "unidade_de_medida_de_estoque",
    "unidade_medida_estoque",
];
const COL_VALUATION_PRICE: &[&str] = &["last_valuation_price", "ultimo_preco_avaliacao"];
const COL_PURCHASE_PRICE: &[&str] = &["last_purchase_price", "ultimo_preco_compra"];
const COL_LOW_STOCK: &[&str] = &["low_stock", "estoque_baixo"];
const COL_REGISTERED_ON: &[&str] = &["registered_on", "data_registro"];

/// Header row of the downloadable template.
pub const TEMPLATE_HEADERS: &[&str] = &[
    "item_number",
    "item_description",
    "item_group",
    "stock_unit",
    "last_valuation_price",
    "last_purchase_price",
    "low_stock",
    "registered_on",
];

const TEMPLATE_ROWS: &[[&str; 8]] = &[
    [
        "ROL-6205",
        "Ball bearing 6205 2RS",
        "Bearings",
        "UN",
        "38.50",
        "41.90",
        "5",
        "2024-01-15",
    ],
    [
        "FLT-HYD-010",
        "Hydraulic return filter 10 micron",
        "Filters",
        "UN",
        "112.00",
        "118.40",
        "3",
        "2024-02-03",
    ],
    [
        "OIL-15W40",
        "Engine oil 15W40",
        "Lubricants",
        "L",
        "22.10",
        "23.75",
        "40",
        "2024-02-20",
    ],
];

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Csv,
    Xlsx,
}

impl SpreadsheetFormat {
    /// Detect the format from the uploaded file name.
    pub fn from_filename(filename: &str) -> Result<Self, CoreError> {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            _ => Err(CoreError::Validation(
                "Unsupported file format. Upload a .csv or .xlsx file".to_string(),
            )),
        }
    }
}

/// A header-keyed data row. Headers are trimmed and lowercased.
pub type RawRow = HashMap<String, String>;

/// Read every data row of an uploaded sheet.
///
/// Returns the normalised headers and the rows (fully blank rows are kept so
/// that reported row numbers match the spreadsheet).
pub fn read_rows(
    format: SpreadsheetFormat,
    bytes: &[u8],
) -> Result<(Vec<String>, Vec<RawRow>), CoreError> {
    match format {
        SpreadsheetFormat::Csv => read_csv(bytes),
        SpreadsheetFormat::Xlsx => read_xlsx(bytes),
    }
}

fn normalise_header(header: &str) -> String {
    header.trim().trim_start_matches('\u{feff}').to_lowercase()
}

fn read_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<RawRow>), CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CoreError::Validation(format!("Invalid CSV file: {e}")))?
        .iter()
        .map(normalise_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CoreError::Validation(format!("Invalid CSV file: {e}")))?;
        let mut row = RawRow::new();
        for (idx, value) in record.iter().enumerate() {
            if let Some(header) = headers.get(idx) {
                row.insert(header.clone(), value.trim().to_string());
            }
        }
        rows.push(row);
    }

    Ok((headers, rows))
}

fn read_xlsx(bytes: &[u8]) -> Result<(Vec<String>, Vec<RawRow>), CoreError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| CoreError::Validation(format!("Invalid XLSX file: {e}")))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| CoreError::Validation("XLSX file has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| CoreError::Validation(format!("Invalid XLSX file: {e}")))?;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| normalise_header(&cell.to_string()))
            .collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let rows = iter
        .map(|data_row| {
            data_row
                .iter()
                .enumerate()
                .filter_map(|(idx, cell)| {
                    headers
                        .get(idx)
                        .map(|h| (h.clone(), cell_text(cell)))
                })
                .collect::<RawRow>()
        })
        .collect();

    Ok((headers, rows))
}

/// Text of an XLSX cell. Date cells become `YYYY-MM-DD HH:MM:SS` so they go
/// through the same date parsing as CSV values.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.to_string(),
        },
        Data::DateTimeIso(iso) => iso.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Column checks
// ---------------------------------------------------------------------------

fn has_column(headers: &[String], aliases: &[&str]) -> bool {
    aliases.iter().any(|a| headers.iter().any(|h| h == a))
}

/// Reject the upload when a required column is missing.
pub fn check_required_columns(headers: &[String]) -> Result<(), CoreError> {
    let required: [(&str, &[&str]); 4] = [
        ("item_number", COL_ITEM_NUMBER),
        ("item_description", COL_DESCRIPTION),
        ("item_group", COL_GROUP),
        ("stock_unit", COL_UNIT),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, aliases)| !has_column(headers, aliases))
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Missing required columns: {}",
            missing.join(", ")
        )))
    }
}

fn cell<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|a| row.get(*a))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// One parsed part row.
#[derive(Debug, Clone, PartialEq)]
pub struct PartImportRow {
    pub code: String,
    pub name: String,
    pub group_name: Option<String>,
    pub unit: String,
    pub last_valuation_price: Option<f64>,
    pub last_purchase_price: Option<f64>,
    pub min_stock: Option<i32>,
    pub registered_on: Option<Date>,
}

/// What to do with a data row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Blank identifier or description; counted as skipped.
    Skip,
    Part(PartImportRow),
    /// Unusable value; counted as an error with this message.
    Invalid(String),
}

/// Interpret a raw row.
pub fn parse_row(row: &RawRow) -> RowOutcome {
    let (code, name) = match (cell(row, COL_ITEM_NUMBER), cell(row, COL_DESCRIPTION)) {
        (Some(code), Some(name)) => (code.to_string(), name.to_string()),
        _ => return RowOutcome::Skip,
    };

    let unit = cell(row, COL_UNIT).unwrap_or("UN").to_string();
    let group_name = cell(row, COL_GROUP).map(str::to_string);

    let last_valuation_price = match cell(row, COL_VALUATION_PRICE).map(parse_decimal) {
        None => None,
        Some(Some(v)) => Some(v),
        Some(None) => return RowOutcome::Invalid("invalid last_valuation_price".to_string()),
    };
    let last_purchase_price = match cell(row, COL_PURCHASE_PRICE).map(parse_decimal) {
        None => None,
        Some(Some(v)) => Some(v),
        Some(None) => return RowOutcome::Invalid("invalid last_purchase_price".to_string()),
    };
    let min_stock = match cell(row, COL_LOW_STOCK).map(parse_decimal) {
        None => None,
        Some(Some(v)) if v >= 0.0 => Some(v.round() as i32),
        Some(_) => return RowOutcome::Invalid("invalid low_stock".to_string()),
    };
    let registered_on = cell(row, COL_REGISTERED_ON).and_then(parse_flexible_date);

    RowOutcome::Part(PartImportRow {
        code,
        name,
        group_name,
        unit,
        last_valuation_price,
        last_purchase_price,
        min_stock,
        registered_on,
    })
}

/// Parse a decimal that may use `,` as the decimal separator.
pub fn parse_decimal(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace(' ', "");
    let normalised = if cleaned.contains(',') && cleaned.contains('.') {
        // 1.234,56
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned.replace(',', ".")
    };
    normalised.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `YYYY-MM-DD`, `DD/MM/YYYY`, `YYYY-MM-DD HH:MM:SS` or the ISO
/// `YYYY-MM-DDTHH:MM:SS` some spreadsheets store.
pub fn parse_flexible_date(value: &str) -> Option<Date> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .ok()
}

/// Code given to an item group created on the fly from its name.
pub fn group_code_for(name: &str) -> String {
    name.trim()
        .chars()
        .take(GROUP_CODE_MAX_LEN)
        .collect::<String>()
        .to_uppercase()
        .replace(' ', "_")
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Summary returned after an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub error_count: usize,
    /// First [`MAX_REPORTED_ERRORS`] row errors.
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Record an error for the row at zero-based `index`.
    pub fn push_error(&mut self, index: usize, message: &str) {
        self.error_count += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors
                .push(format!("Row {}: {message}", index + FIRST_DATA_ROW));
        }
    }
}

/// CSV template offered for download.
pub fn template_csv() -> Result<String, CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let internal = |e: csv::Error| CoreError::Internal(format!("Failed to build template: {e}"));
    writer.write_record(TEMPLATE_HEADERS).map_err(internal)?;
    for row in TEMPLATE_ROWS {
        writer.write_record(row).map_err(internal)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| CoreError::Internal(format!("Failed to build template: {e}")))?;
    String::from_utf8(bytes).map_err(|e| CoreError::Internal(e.to_string()))
}
