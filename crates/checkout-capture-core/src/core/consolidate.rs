// crates/checkout-capture-core/src/core/consolidate.rs
// ============================================================================
// Module: Consolidation Projection
// Description: Read-time projection from the append-only log to export rows.
// Purpose: Fold scattered capture events into one latest-wins row per identity.
// Dependencies: checkout-capture-core records
// ============================================================================

//! ## Overview
//! The store is an append-only event log: repeated edits to the same field
//! append new rows rather than overwriting. This module is the separate
//! read-time projection that groups records by identity and keeps the
//! chronologically latest value per field name (ties broken by the higher
//! record id). Order snapshots flatten into fixed columns plus a products
//! text block. Output is deterministic: dynamic field columns are sorted
//! lexicographically and rows are sorted by identity wire form, so repeated
//! exports of the same store are byte-comparable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::identity::Identity;
use crate::core::record::CapturePayload;
use crate::core::record::CaptureRecord;
use crate::core::record::OrderSnapshot;
use crate::core::record::RecordId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header label for the identity column.
pub const IDENTITY_COLUMN: &str = "identity";
/// Header label for the flattened line-item column.
pub const PRODUCTS_COLUMN: &str = "products";
/// Fixed snapshot columns, appended after the dynamic field columns when at
/// least one identity carries an order snapshot.
pub const SNAPSHOT_COLUMNS: [&str; 8] = [
    "billing_first_name",
    "billing_last_name",
    "billing_email",
    "billing_phone",
    "billing_address",
    "shipping_address",
    "order_total",
    PRODUCTS_COLUMN,
];

// ============================================================================
// SECTION: Report
// ============================================================================

/// Tabular consolidation output: one header, one row per identity.
///
/// # Invariants
/// - `columns[0]` is [`IDENTITY_COLUMN`]; every row has `columns.len()`
///   cells with the identity wire form first.
/// - Rows are sorted by identity wire form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationReport {
    /// Header labels, identity column first.
    pub columns: Vec<String>,
    /// One cell row per identity, aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl ConsolidationReport {
    /// Returns true when the report holds no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Latest-wins accumulator for one identity.
#[derive(Debug, Default)]
struct IdentityAccumulator {
    /// Latest value per field name, with its winning (timestamp, id) pair.
    fields: BTreeMap<String, (Timestamp, RecordId, String)>,
    /// Latest order snapshot, with its winning (timestamp, id) pair.
    snapshot: Option<(Timestamp, RecordId, OrderSnapshot)>,
}

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Projects capture records into one latest-wins row per identity.
///
/// An empty input yields an empty report; refusing to export without data is
/// the export layer's concern.
#[must_use]
pub fn consolidate(records: &[CaptureRecord]) -> ConsolidationReport {
    let mut groups: BTreeMap<String, (Identity, IdentityAccumulator)> = BTreeMap::new();
    for record in records {
        let entry = groups
            .entry(record.identity.wire())
            .or_insert_with(|| (record.identity.clone(), IdentityAccumulator::default()));
        let stamp = (record.captured_at, record.record_id);
        match &record.payload {
            CapturePayload::Field(observation) => {
                let current = entry.1.fields.get(&observation.name);
                if current.is_none_or(|(at, id, _)| stamp > (*at, *id)) {
                    entry.1.fields.insert(
                        observation.name.clone(),
                        (record.captured_at, record.record_id, observation.value.clone()),
                    );
                }
            }
            CapturePayload::Order(snapshot) => {
                let current = entry.1.snapshot.as_ref();
                if current.is_none_or(|(at, id, _)| stamp > (*at, *id)) {
                    entry.1.snapshot =
                        Some((record.captured_at, record.record_id, snapshot.clone()));
                }
            }
        }
    }

    let mut field_columns: Vec<String> = groups
        .values()
        .flat_map(|(_, acc)| acc.fields.keys().cloned())
        .collect();
    field_columns.sort();
    field_columns.dedup();
    let any_snapshot = groups.values().any(|(_, acc)| acc.snapshot.is_some());

    let mut columns = Vec::with_capacity(1 + field_columns.len() + SNAPSHOT_COLUMNS.len());
    columns.push(IDENTITY_COLUMN.to_string());
    columns.extend(field_columns.iter().cloned());
    if any_snapshot {
        columns.extend(SNAPSHOT_COLUMNS.iter().map(ToString::to_string));
    }

    let rows = groups
        .into_iter()
        .map(|(wire, (_, acc))| {
            let mut row = Vec::with_capacity(columns.len());
            row.push(wire);
            for field in &field_columns {
                let value = acc.fields.get(field).map(|(_, _, v)| v.clone()).unwrap_or_default();
                row.push(value);
            }
            if any_snapshot {
                row.extend(snapshot_cells(acc.snapshot.as_ref().map(|(_, _, s)| s)));
            }
            row
        })
        .collect();

    ConsolidationReport {
        columns,
        rows,
    }
}

/// Renders line items as one text block, one item per line.
#[must_use]
pub fn product_lines(snapshot: &OrderSnapshot) -> String {
    snapshot
        .line_items
        .iter()
        .map(|item| {
            format!(
                "Name: {}, Quantity: {}, SKU: {}, Price: {}",
                item.name, item.quantity, item.sku, item.price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Flattens an optional snapshot into the fixed snapshot cells.
fn snapshot_cells(snapshot: Option<&OrderSnapshot>) -> Vec<String> {
    let Some(snapshot) = snapshot else {
        return vec![String::new(); SNAPSHOT_COLUMNS.len()];
    };
    vec![
        snapshot.billing_first_name.clone(),
        snapshot.billing_last_name.clone(),
        snapshot.billing_email.clone(),
        snapshot.billing_phone.clone(),
        snapshot.billing_address.clone(),
        snapshot.shipping_address.clone(),
        snapshot.order_total.clone(),
        product_lines(snapshot),
    ]
}
