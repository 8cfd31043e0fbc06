// crates/checkout-capture-core/tests/consolidation_unit.rs
// ============================================================================
// Module: Consolidation Unit Tests
// Description: Targeted tests for the latest-wins consolidation projection.
// Purpose: Validate grouping, latest-wins selection, snapshot flattening,
//          and deterministic output ordering.
// ============================================================================

//! ## Overview
//! Unit-level tests for the consolidation projection:
//! - One output row per identity with latest-wins field values
//! - Tie-breaking on record id when timestamps collide
//! - Order snapshot flattening and products text block
//! - Deterministic column and row ordering
//! - Empty input yields an empty report

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "Test-only assertions and helpers are permitted."
)]

use checkout_capture_core::CaptureRecord;
use checkout_capture_core::CaptureStore;
use checkout_capture_core::FieldObservation;
use checkout_capture_core::IDENTITY_COLUMN;
use checkout_capture_core::Identity;
use checkout_capture_core::InMemoryCaptureStore;
use checkout_capture_core::LineItem;
use checkout_capture_core::NewCaptureRecord;
use checkout_capture_core::OrderSnapshot;
use checkout_capture_core::RecordId;
use checkout_capture_core::SNAPSHOT_COLUMNS;
use checkout_capture_core::Timestamp;
use checkout_capture_core::consolidate;
use checkout_capture_core::product_lines;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn field_record(id: u64, identity: &Identity, name: &str, value: &str, at: i64) -> CaptureRecord {
    CaptureRecord::from_new(
        RecordId::new(id),
        NewCaptureRecord::field(
            identity.clone(),
            FieldObservation {
                name: name.to_string(),
                value: value.to_string(),
            },
            Timestamp::from_unix_millis(at),
        ),
    )
}

fn sample_snapshot() -> OrderSnapshot {
    OrderSnapshot {
        billing_first_name: "Ada".to_string(),
        billing_last_name: "Lovelace".to_string(),
        billing_email: "ada@example.com".to_string(),
        billing_phone: "555-0100".to_string(),
        billing_address: "1 Analytical Way".to_string(),
        shipping_address: "2 Difference St".to_string(),
        order_total: "99.50".to_string(),
        line_items: vec![
            LineItem {
                name: "Widget".to_string(),
                quantity: 2,
                sku: "W-1".to_string(),
                price: "24.75".to_string(),
            },
            LineItem {
                name: "Gadget".to_string(),
                quantity: 1,
                sku: "G-9".to_string(),
                price: "50.00".to_string(),
            },
        ],
    }
}

// ============================================================================
// SECTION: Projection Tests
// ============================================================================

#[test]
fn empty_input_yields_empty_report() {
    let report = consolidate(&[]);
    assert!(report.is_empty());
    assert_eq!(report.columns, vec![IDENTITY_COLUMN.to_string()]);
}

#[test]
fn one_row_per_identity_with_latest_values() {
    let alice = Identity::session("alice").expect("session");
    let bob = Identity::user(7).expect("user");
    let records = vec![
        field_record(1, &alice, "billing_email", "old@example.com", 100),
        field_record(2, &alice, "billing_email", "new@example.com", 200),
        field_record(3, &alice, "billing_phone", "555-0101", 150),
        field_record(4, &bob, "billing_email", "bob@example.com", 120),
    ];
    let report = consolidate(&records);
    assert_eq!(report.columns, vec![
        "identity".to_string(),
        "billing_email".to_string(),
        "billing_phone".to_string(),
    ]);
    assert_eq!(report.rows.len(), 2);
    // Rows sort by identity wire form: "session:alice" < "user:7".
    assert_eq!(report.rows[0], vec![
        "session:alice".to_string(),
        "new@example.com".to_string(),
        "555-0101".to_string(),
    ]);
    assert_eq!(report.rows[1], vec![
        "user:7".to_string(),
        "bob@example.com".to_string(),
        String::new(),
    ]);
}

#[test]
fn timestamp_ties_break_on_higher_record_id() {
    let identity = Identity::session("tied").expect("session");
    let records = vec![
        field_record(2, &identity, "city", "Second", 100),
        field_record(1, &identity, "city", "First", 100),
    ];
    let report = consolidate(&records);
    assert_eq!(report.rows[0][1], "Second");
}

#[test]
fn out_of_order_arrival_still_picks_latest_timestamp() {
    let identity = Identity::session("reordered").expect("session");
    let records = vec![
        field_record(5, &identity, "zip", "99999", 50),
        field_record(3, &identity, "zip", "11111", 500),
    ];
    let report = consolidate(&records);
    assert_eq!(report.rows[0][1], "11111");
}

#[test]
fn snapshot_flattens_into_fixed_columns() {
    let order = Identity::order(31).expect("order");
    let snapshot = sample_snapshot();
    let record = CaptureRecord::from_new(
        RecordId::new(1),
        NewCaptureRecord::order(order, snapshot.clone(), Timestamp::from_unix_millis(10)),
    );
    let report = consolidate(&[record]);
    let mut expected_columns = vec![IDENTITY_COLUMN.to_string()];
    expected_columns.extend(SNAPSHOT_COLUMNS.iter().map(ToString::to_string));
    assert_eq!(report.columns, expected_columns);
    let row = &report.rows[0];
    assert_eq!(row[0], "order:31");
    assert_eq!(row[1], "Ada");
    assert_eq!(row[3], "ada@example.com");
    assert_eq!(row[7], "99.50");
    assert_eq!(
        row[8],
        "Name: Widget, Quantity: 2, SKU: W-1, Price: 24.75\nName: Gadget, Quantity: 1, SKU: G-9, \
         Price: 50.00"
    );
}

#[test]
fn snapshot_columns_absent_without_snapshots() {
    let identity = Identity::session("plain").expect("session");
    let report = consolidate(&[field_record(1, &identity, "city", "Turin", 5)]);
    assert_eq!(report.columns.len(), 2);
    assert!(!report.columns.iter().any(|c| SNAPSHOT_COLUMNS.contains(&c.as_str())));
}

#[test]
fn product_lines_renders_one_item_per_line() {
    let snapshot = sample_snapshot();
    let block = product_lines(&snapshot);
    assert_eq!(block.lines().count(), 2);
    assert!(block.starts_with("Name: Widget, Quantity: 2"));
}

#[test]
fn order_snapshot_round_trips_through_store_and_projection() {
    let store = InMemoryCaptureStore::new();
    let order = Identity::order(88).expect("order");
    let snapshot = sample_snapshot();
    store
        .append(NewCaptureRecord::order(
            order,
            snapshot.clone(),
            Timestamp::from_unix_millis(7),
        ))
        .expect("append");
    let records = store.load_all().expect("load");
    let report = consolidate(&records);
    let row = &report.rows[0];
    assert_eq!(row[1], snapshot.billing_first_name);
    assert_eq!(row[2], snapshot.billing_last_name);
    assert_eq!(row[3], snapshot.billing_email);
    assert_eq!(row[4], snapshot.billing_phone);
    assert_eq!(row[5], snapshot.billing_address);
    assert_eq!(row[6], snapshot.shipping_address);
    assert_eq!(row[7], snapshot.order_total);
    assert_eq!(row[8], product_lines(&snapshot));
}

#[test]
fn purge_empties_the_store_and_reports_count() {
    let store = InMemoryCaptureStore::new();
    let identity = Identity::session("purged").expect("session");
    for i in 0 .. 3 {
        store
            .append(NewCaptureRecord::field(
                identity.clone(),
                FieldObservation {
                    name: format!("field_{i}"),
                    value: "v".to_string(),
                },
                Timestamp::from_unix_millis(i),
            ))
            .expect("append");
    }
    assert_eq!(store.purge().expect("purge"), 3);
    assert!(store.load_all().expect("load").is_empty());
}
