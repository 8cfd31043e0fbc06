// crates/checkout-capture-core/src/core/mod.rs
// ============================================================================
// Module: Core Model Modules
// Description: Module wiring for the checkout capture domain model.
// Purpose: Group identity, record, sanitization, store, and projection modules.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Submodule wiring for the capture domain. Types are re-exported at the
//! crate root; callers should not need to path into these modules directly.

/// Read-time consolidation projection.
pub mod consolidate;
/// Opaque grouping identities.
pub mod identity;
/// Capture record model.
pub mod record;
/// Form input sanitization.
pub mod sanitize;
/// Append-only store interface and reference backend.
pub mod store;
/// Boundary-supplied timestamps.
pub mod time;
