// crates/checkout-capture-export/src/export.rs
// ============================================================================
// Module: Spreadsheet Export
// Description: XLSX rendering and temp-file spooling for capture reports.
// Purpose: Produce a complete download artifact from consolidated records.
// Dependencies: checkout-capture-core, rust_xlsxwriter, tempfile, thiserror
// ============================================================================

//! ## Overview
//! Rendering is a pure function of the consolidation report: the first row is
//! the column header set, each following row is one identity. The workbook is
//! written through a named temporary file and read back into memory; the file
//! is removed when the handle drops, including on every error path.
//!
//! An empty store is a distinct outcome, not an empty spreadsheet: callers
//! receive [`ExportError::NoData`] and surface it as a user-visible condition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use checkout_capture_core::CaptureRecord;
use checkout_capture_core::ConsolidationReport;
use checkout_capture_core::consolidate;
use rust_xlsxwriter::Workbook;
use tempfile::Builder;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// MIME content type for XLSX downloads.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Prefix for spool files, so stray files are attributable if cleanup is
/// ever interrupted by a crash.
const SPOOL_PREFIX: &str = "checkout-capture-";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Export pipeline errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The store holds no capture records.
    #[error("no capture data available for export")]
    NoData,
    /// Workbook rendering failed.
    #[error("export render error: {0}")]
    Render(String),
    /// Spool file I/O failed.
    #[error("export io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// A complete, in-memory export artifact ready to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Complete workbook bytes.
    pub bytes: Vec<u8>,
    /// Download filename offered to the client.
    pub filename: String,
    /// MIME content type for the download.
    pub content_type: &'static str,
}

// ============================================================================
// SECTION: Export Pipeline
// ============================================================================

/// Consolidates records and renders the downloadable artifact.
///
/// # Errors
///
/// Returns [`ExportError::NoData`] when `records` is empty, and
/// [`ExportError::Render`] or [`ExportError::Io`] on rendering or spooling
/// failures.
pub fn export_records(
    records: &[CaptureRecord],
    worksheet_name: &str,
    filename: &str,
) -> Result<ExportArtifact, ExportError> {
    let report = consolidate(records);
    if report.is_empty() {
        return Err(ExportError::NoData);
    }
    let bytes = render_workbook(&report, worksheet_name)?;
    Ok(ExportArtifact {
        bytes,
        filename: filename.to_string(),
        content_type: XLSX_CONTENT_TYPE,
    })
}

/// Renders a consolidation report into XLSX workbook bytes.
///
/// The workbook is spooled through a named temporary file that is deleted
/// when this function returns, on success and on error alike.
///
/// # Errors
///
/// Returns [`ExportError::Render`] when the workbook cannot be built and
/// [`ExportError::Io`] when the spool file cannot be written or read back.
pub fn render_workbook(
    report: &ConsolidationReport,
    worksheet_name: &str,
) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(worksheet_name)
        .map_err(|err| ExportError::Render(err.to_string()))?;
    for (column_index, column) in report.columns.iter().enumerate() {
        let col = column_number(column_index)?;
        worksheet
            .write_string(0, col, column)
            .map_err(|err| ExportError::Render(err.to_string()))?;
    }
    for (row_index, row) in report.rows.iter().enumerate() {
        let excel_row = row_number(row_index)?;
        for (column_index, cell) in row.iter().enumerate() {
            let col = column_number(column_index)?;
            worksheet
                .write_string(excel_row, col, cell)
                .map_err(|err| ExportError::Render(err.to_string()))?;
        }
    }
    let spool = Builder::new()
        .prefix(SPOOL_PREFIX)
        .suffix(".xlsx")
        .tempfile()
        .map_err(|err| ExportError::Io(err.to_string()))?;
    workbook
        .save(spool.path())
        .map_err(|err| ExportError::Render(err.to_string()))?;
    let bytes = fs::read(spool.path()).map_err(|err| ExportError::Io(err.to_string()))?;
    Ok(bytes)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts a zero-based report column index to an XLSX column number.
fn column_number(index: usize) -> Result<u16, ExportError> {
    u16::try_from(index).map_err(|_| ExportError::Render("too many export columns".to_string()))
}

/// Converts a zero-based report row index to an XLSX row number.
///
/// Row zero in the worksheet is the header, so data rows shift down by one.
fn row_number(index: usize) -> Result<u32, ExportError> {
    let row = u32::try_from(index).map_err(|_| ExportError::Render("too many export rows".to_string()))?;
    row.checked_add(1).ok_or_else(|| ExportError::Render("too many export rows".to_string()))
}
