// crates/checkout-capture-core/src/lib.rs
// ============================================================================
// Module: Checkout Capture Core
// Description: Domain model for checkout field capture and consolidation.
// Purpose: Provide identity, record, sanitization, store, and projection types.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This crate defines the checkout capture domain: opaque identities, the
//! append-only capture record model, input sanitization, the capture store
//! interface with an in-memory reference backend, and the read-time
//! consolidation projection that folds scattered field events into one row
//! per identity. The store is an append-only event log; consolidation is a
//! separate, clearly named read-time operation. Core code never reads
//! wall-clock time; boundaries supply timestamps.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::consolidate::ConsolidationReport;
pub use core::consolidate::IDENTITY_COLUMN;
pub use core::consolidate::PRODUCTS_COLUMN;
pub use core::consolidate::SNAPSHOT_COLUMNS;
pub use core::consolidate::consolidate;
pub use core::consolidate::product_lines;
pub use core::identity::Identity;
pub use core::identity::IdentityError;
pub use core::record::CapturePayload;
pub use core::record::CaptureRecord;
pub use core::record::FieldObservation;
pub use core::record::LineItem;
pub use core::record::NewCaptureRecord;
pub use core::record::OrderSnapshot;
pub use core::record::RecordId;
pub use core::sanitize::MAX_FIELD_NAME_CHARS;
pub use core::sanitize::MAX_FIELD_VALUE_CHARS;
pub use core::sanitize::SanitizeError;
pub use core::sanitize::sanitize_field_name;
pub use core::sanitize::sanitize_field_value;
pub use core::store::CaptureStore;
pub use core::store::InMemoryCaptureStore;
pub use core::store::SharedCaptureStore;
pub use core::store::StoreError;
pub use core::time::Timestamp;
