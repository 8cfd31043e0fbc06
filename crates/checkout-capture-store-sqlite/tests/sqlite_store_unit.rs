// crates/checkout-capture-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Capture Store Unit Tests
// Description: Targeted tests for the SQLite capture store.
// Purpose: Validate append/load round-trips, payload shape enforcement,
//          schema versioning and migration, path safety, and purge.
// ============================================================================

//! ## Overview
//! Unit-level tests for `SQLite` store invariants:
//! - Append/load round-trips for field and order payloads
//! - Payload shape violations fail closed as corruption
//! - Schema version guard rejects unknown versions
//! - Version 1 databases migrate in place without losing rows
//! - Path safety checks (directory rejection)
//! - Purge removes every row and reports the count

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::PathBuf;

use checkout_capture_core::CapturePayload;
use checkout_capture_core::CaptureStore;
use checkout_capture_core::FieldObservation;
use checkout_capture_core::Identity;
use checkout_capture_core::LineItem;
use checkout_capture_core::NewCaptureRecord;
use checkout_capture_core::OrderSnapshot;
use checkout_capture_core::StoreError;
use checkout_capture_core::Timestamp;
use checkout_capture_store_sqlite::SCHEMA_VERSION;
use checkout_capture_store_sqlite::SqliteCaptureStore;
use checkout_capture_store_sqlite::SqliteJournalMode;
use checkout_capture_store_sqlite::SqliteStoreConfig;
use checkout_capture_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn store_config(dir: &TempDir) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: dir.path().join("capture.db"),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteJournalMode::Wal,
        sync_mode: SqliteSyncMode::Normal,
    }
}

fn field_record(session: &str, name: &str, value: &str, at: i64) -> NewCaptureRecord {
    NewCaptureRecord::field(
        Identity::session(session).expect("session"),
        FieldObservation {
            name: name.to_string(),
            value: value.to_string(),
        },
        Timestamp::from_unix_millis(at),
    )
}

fn sample_snapshot() -> OrderSnapshot {
    OrderSnapshot {
        billing_first_name: "Grace".to_string(),
        billing_last_name: "Hopper".to_string(),
        billing_email: "grace@example.com".to_string(),
        billing_phone: "555-0199".to_string(),
        billing_address: "3 Compiler Ct".to_string(),
        shipping_address: "4 Nanosecond Ln".to_string(),
        order_total: "12.00".to_string(),
        line_items: vec![LineItem {
            name: "Cable".to_string(),
            quantity: 3,
            sku: "C-30".to_string(),
            price: "4.00".to_string(),
        }],
    }
}

// ============================================================================
// SECTION: Round-Trip Tests
// ============================================================================

#[test]
fn field_records_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteCaptureStore::new(&store_config(&dir)).expect("open store");
    let first = store.append(field_record("s1", "billing_email", "a@example.com", 10));
    let second = store.append(field_record("s1", "billing_email", "b@example.com", 20));
    assert!(first.expect("first append") < second.expect("second append"));
    let records = store.load_all().expect("load");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].identity.wire(), "session:s1");
    match &records[1].payload {
        CapturePayload::Field(observation) => {
            assert_eq!(observation.value, "b@example.com");
        }
        CapturePayload::Order(_) => panic!("expected field payload"),
    }
    assert_eq!(records[1].captured_at, Timestamp::from_unix_millis(20));
}

#[test]
fn order_snapshots_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteCaptureStore::new(&store_config(&dir)).expect("open store");
    let snapshot = sample_snapshot();
    store
        .append(NewCaptureRecord::order(
            Identity::order(5).expect("order"),
            snapshot.clone(),
            Timestamp::from_unix_millis(99),
        ))
        .expect("append");
    let records = store.load_all().expect("load");
    assert_eq!(records.len(), 1);
    match &records[0].payload {
        CapturePayload::Order(loaded) => assert_eq!(loaded, &snapshot),
        CapturePayload::Field(_) => panic!("expected order payload"),
    }
}

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let config = store_config(&dir);
    {
        let store = SqliteCaptureStore::new(&config).expect("open store");
        store.append(field_record("s2", "zip", "12345", 1)).expect("append");
    }
    let store = SqliteCaptureStore::new(&config).expect("reopen store");
    assert_eq!(store.load_all().expect("load").len(), 1);
}

// ============================================================================
// SECTION: Integrity Tests
// ============================================================================

#[test]
fn ambiguous_payload_columns_fail_closed() {
    let dir = TempDir::new().expect("tempdir");
    let config = store_config(&dir);
    let store = SqliteCaptureStore::new(&config).expect("open store");
    let connection = Connection::open(&config.path).expect("raw open");
    connection
        .execute(
            "INSERT INTO capture_records (identity, field_name, field_value, product_data, \
             captured_at) VALUES ('session:x', 'name', 'value', '{}', 0)",
            params![],
        )
        .expect("tamper insert");
    let result = store.load_all();
    assert!(matches!(result, Err(StoreError::Corrupt(_))));
}

#[test]
fn invalid_stored_identity_fails_closed() {
    let dir = TempDir::new().expect("tempdir");
    let config = store_config(&dir);
    let store = SqliteCaptureStore::new(&config).expect("open store");
    let connection = Connection::open(&config.path).expect("raw open");
    connection
        .execute(
            "INSERT INTO capture_records (identity, field_name, field_value, captured_at) \
             VALUES ('mystery:1', 'name', 'value', 0)",
            params![],
        )
        .expect("tamper insert");
    assert!(matches!(store.load_all(), Err(StoreError::Corrupt(_))));
}

#[test]
fn unknown_schema_version_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let config = store_config(&dir);
    drop(SqliteCaptureStore::new(&config).expect("open store"));
    let connection = Connection::open(&config.path).expect("raw open");
    connection
        .execute("UPDATE store_meta SET version = 99", params![])
        .expect("bump version");
    drop(connection);
    let result = SqliteCaptureStore::new(&config);
    assert!(result.is_err());
}

#[test]
fn version_one_database_migrates_in_place() {
    let dir = TempDir::new().expect("tempdir");
    let config = store_config(&dir);
    {
        let connection = Connection::open(&config.path).expect("raw open");
        connection
            .execute_batch(
                "CREATE TABLE store_meta (version INTEGER NOT NULL);
                 INSERT INTO store_meta (version) VALUES (1);
                 CREATE TABLE capture_records (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     identity TEXT NOT NULL,
                     field_name TEXT,
                     field_value TEXT,
                     captured_at INTEGER NOT NULL
                 );
                 INSERT INTO capture_records (identity, field_name, field_value, captured_at)
                     VALUES ('session:legacy', 'city', 'Paris', 42);",
            )
            .expect("seed v1");
    }
    let store = SqliteCaptureStore::new(&config).expect("open migrates");
    let records = store.load_all().expect("load");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identity.wire(), "session:legacy");
    let connection = Connection::open(&config.path).expect("raw open");
    let version: i64 = connection
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .expect("version");
    assert_eq!(version, SCHEMA_VERSION);
    store
        .append(NewCaptureRecord::order(
            Identity::order(1).expect("order"),
            sample_snapshot(),
            Timestamp::from_unix_millis(50),
        ))
        .expect("order append after migration");
}

// ============================================================================
// SECTION: Path and Purge Tests
// ============================================================================

#[test]
fn directory_store_path_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let config = SqliteStoreConfig {
        path: PathBuf::from(dir.path()),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteJournalMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    };
    assert!(SqliteCaptureStore::new(&config).is_err());
}

#[test]
fn purge_removes_all_rows_and_reports_count() {
    let dir = TempDir::new().expect("tempdir");
    let store = SqliteCaptureStore::new(&store_config(&dir)).expect("open store");
    for i in 0 .. 4 {
        store.append(field_record("s3", "field", "v", i)).expect("append");
    }
    assert_eq!(store.purge().expect("purge"), 4);
    assert!(store.load_all().expect("load").is_empty());
}
