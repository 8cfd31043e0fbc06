// crates/checkout-capture-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Capture Store
// Description: Durable CaptureStore backend using SQLite WAL.
// Purpose: Provide production persistence for the append-only capture log.
// Dependencies: checkout-capture-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`checkout_capture_core::CaptureStore`]
//! implementation persisting the superset capture schema (identity, field
//! name/value, structured order payload, timestamp) behind an explicit
//! schema version guard with stepwise migrations. Database contents are
//! treated as untrusted on read.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SCHEMA_VERSION;
pub use store::SqliteCaptureStore;
pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
