// crates/checkout-capture-core/src/core/time.rs
// ============================================================================
// Module: Capture Time Model
// Description: Canonical timestamp representation for capture records.
// Purpose: Keep consolidation deterministic by making time an explicit input.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Capture records carry explicit timestamps supplied by the boundary that
//! observed the event. The core never reads wall-clock time, so the
//! latest-wins consolidation projection is replayable from stored records
//! alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp for capture records, in unix epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads
///   wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}
