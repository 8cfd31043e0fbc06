// crates/checkout-capture-core/src/core/store.rs
// ============================================================================
// Module: Capture Store Interface
// Description: Append-only store contract with an in-memory reference backend.
// Purpose: Decouple capture and export paths from the storage engine.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! The capture store is an append-only event log. Appends are individually
//! atomic; no cross-row transactions exist anywhere in the system. Reads
//! materialize the whole log (a documented scaling limit of the export
//! path). [`InMemoryCaptureStore`] is the reference backend used by tests
//! and the `memory` config backend; the SQLite crate provides durability.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;

use crate::core::record::CaptureRecord;
use crate::core::record::NewCaptureRecord;
use crate::core::record::RecordId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Capture store errors.
///
/// # Invariants
/// - Messages avoid embedding captured field values.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    /// Store I/O error.
    #[error("capture store io error: {0}")]
    Io(String),
    /// Storage engine error.
    #[error("capture store error: {0}")]
    Store(String),
    /// Invalid store data.
    #[error("capture store invalid data: {0}")]
    Invalid(String),
    /// Store schema version mismatch.
    #[error("capture store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store corruption detected on read.
    #[error("capture store corruption: {0}")]
    Corrupt(String),
}

// ============================================================================
// SECTION: Store Trait
// ============================================================================

/// Append-only capture record store.
pub trait CaptureStore: Send + Sync {
    /// Appends one record and returns its store-assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails. Callers report the
    /// failure synchronously; there are no retries.
    fn append(&self, record: NewCaptureRecord) -> Result<RecordId, StoreError>;

    /// Loads every stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails or stored rows are
    /// corrupt.
    fn load_all(&self) -> Result<Vec<CaptureRecord>, StoreError>;

    /// Deletes every stored record and returns the removed count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn purge(&self) -> Result<u64, StoreError>;
}

/// Cheaply clonable shared handle over a capture store.
#[derive(Clone)]
pub struct SharedCaptureStore {
    /// Underlying store implementation.
    inner: Arc<dyn CaptureStore>,
}

impl SharedCaptureStore {
    /// Wraps a concrete store in a shared handle.
    #[must_use]
    pub fn from_store(store: impl CaptureStore + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }
}

impl CaptureStore for SharedCaptureStore {
    fn append(&self, record: NewCaptureRecord) -> Result<RecordId, StoreError> {
        self.inner.append(record)
    }

    fn load_all(&self) -> Result<Vec<CaptureRecord>, StoreError> {
        self.inner.load_all()
    }

    fn purge(&self) -> Result<u64, StoreError> {
        self.inner.purge()
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Mutable state behind the in-memory store mutex.
#[derive(Debug, Default)]
struct InMemoryState {
    /// Next surrogate identifier to assign.
    next_id: u64,
    /// Stored records in append order.
    records: Vec<CaptureRecord>,
}

/// In-memory reference store backed by a mutex-guarded vector.
#[derive(Debug, Default)]
pub struct InMemoryCaptureStore {
    /// Guarded append-only record list.
    state: Mutex<InMemoryState>,
}

impl InMemoryCaptureStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaptureStore for InMemoryCaptureStore {
    fn append(&self, record: NewCaptureRecord) -> Result<RecordId, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Store("capture store mutex poisoned".to_string()))?;
        state.next_id = state
            .next_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Store("record id overflow".to_string()))?;
        let record_id = RecordId::new(state.next_id);
        state.records.push(CaptureRecord::from_new(record_id, record));
        Ok(record_id)
    }

    fn load_all(&self) -> Result<Vec<CaptureRecord>, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Store("capture store mutex poisoned".to_string()))?;
        Ok(state.records.clone())
    }

    fn purge(&self) -> Result<u64, StoreError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Store("capture store mutex poisoned".to_string()))?;
        let removed = u64::try_from(state.records.len()).unwrap_or(u64::MAX);
        state.records.clear();
        Ok(removed)
    }
}
