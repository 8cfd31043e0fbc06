// crates/checkout-capture-core/src/core/record.rs
// ============================================================================
// Module: Capture Records
// Description: Append-only capture record model and order snapshots.
// Purpose: Represent one field observation or one checkout snapshot per row.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! One capture record holds exactly one payload: a scalar field observation
//! (a name/value pair from a form edit) or a structured order snapshot taken
//! at checkout completion. Records are never updated or deleted by capture
//! paths; history accumulates and the consolidation projection picks the
//! latest value per field per identity at read time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identity::Identity;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Surrogate record identifier assigned by the store.
///
/// # Invariants
/// - Assigned strictly increasing per store; never reused after a purge
///   within the same store lifetime is not guaranteed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record identifier from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Payloads
// ============================================================================

/// One sanitized field observation from a checkout form edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldObservation {
    /// Sanitized field name.
    pub name: String,
    /// Sanitized field value.
    pub value: String,
}

/// One purchased line item within an order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product name.
    pub name: String,
    /// Purchased quantity.
    pub quantity: u32,
    /// Stock keeping unit.
    pub sku: String,
    /// Unit price as currency text, rendered verbatim.
    pub price: String,
}

/// Structured checkout snapshot taken when an order is finalized.
///
/// # Invariants
/// - Totals and prices are opaque currency text; no numeric parsing is
///   applied anywhere in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// Billing first name.
    pub billing_first_name: String,
    /// Billing last name.
    pub billing_last_name: String,
    /// Billing email address.
    pub billing_email: String,
    /// Billing phone number.
    pub billing_phone: String,
    /// Billing address line.
    pub billing_address: String,
    /// Shipping address line.
    pub shipping_address: String,
    /// Order total as currency text.
    pub order_total: String,
    /// Purchased line items.
    pub line_items: Vec<LineItem>,
}

/// Payload variants stored in one capture record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CapturePayload {
    /// Scalar field observation.
    Field(FieldObservation),
    /// Structured order snapshot.
    Order(OrderSnapshot),
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// A capture record awaiting a store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCaptureRecord {
    /// Grouping identity for the record.
    pub identity: Identity,
    /// Captured payload.
    pub payload: CapturePayload,
    /// Boundary-supplied capture time.
    pub captured_at: Timestamp,
}

impl NewCaptureRecord {
    /// Builds a field-observation record.
    #[must_use]
    pub const fn field(
        identity: Identity,
        observation: FieldObservation,
        captured_at: Timestamp,
    ) -> Self {
        Self {
            identity,
            payload: CapturePayload::Field(observation),
            captured_at,
        }
    }

    /// Builds an order-snapshot record.
    #[must_use]
    pub const fn order(
        identity: Identity,
        snapshot: OrderSnapshot,
        captured_at: Timestamp,
    ) -> Self {
        Self {
            identity,
            payload: CapturePayload::Order(snapshot),
            captured_at,
        }
    }
}

/// A stored capture record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRecord {
    /// Store-assigned surrogate identifier.
    pub record_id: RecordId,
    /// Grouping identity for the record.
    pub identity: Identity,
    /// Captured payload.
    pub payload: CapturePayload,
    /// Boundary-supplied capture time.
    pub captured_at: Timestamp,
}

impl CaptureRecord {
    /// Attaches a store-assigned identifier to a new record.
    #[must_use]
    pub fn from_new(record_id: RecordId, record: NewCaptureRecord) -> Self {
        Self {
            record_id,
            identity: record.identity,
            payload: record.payload,
            captured_at: record.captured_at,
        }
    }
}
