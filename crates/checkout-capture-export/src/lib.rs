// crates/checkout-capture-export/src/lib.rs
// ============================================================================
// Module: Checkout Capture Export Crate
// Description: Spreadsheet rendering and artifact spooling.
// Purpose: Turn consolidated capture data into a downloadable XLSX artifact.
// Dependencies: checkout-capture-core, rust_xlsxwriter, tempfile, thiserror
// ============================================================================

//! ## Overview
//! Export pipeline: consolidate capture records into a report, render the
//! report into an XLSX workbook spooled through a temporary file, and hand
//! back an in-memory artifact. The temporary file never outlives the call,
//! so no spreadsheet bytes linger on disk after the download is served.

pub mod export;

pub use export::ExportArtifact;
pub use export::ExportError;
pub use export::XLSX_CONTENT_TYPE;
pub use export::export_records;
pub use export::render_workbook;
