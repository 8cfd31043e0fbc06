// crates/checkout-capture-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Capture Store
// Description: Durable CaptureStore backed by SQLite WAL.
// Purpose: Persist capture records in the superset schema with migrations.
// Dependencies: checkout-capture-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`CaptureStore`] using `SQLite`. The
//! schema is the superset of every historical shape (identity, scalar field
//! columns, structured order payload, timestamp) guarded by a `store_meta`
//! version row; opening an older database runs explicit migration steps and
//! never silently drops a column. Each row holds exactly one payload:
//! scalar field columns or the JSON order payload, never both. Reads treat
//! stored rows as untrusted and fail closed on shape violations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use checkout_capture_core::CapturePayload;
use checkout_capture_core::CaptureRecord;
use checkout_capture_core::CaptureStore;
use checkout_capture_core::FieldObservation;
use checkout_capture_core::Identity;
use checkout_capture_core::NewCaptureRecord;
use checkout_capture_core::OrderSnapshot;
use checkout_capture_core::RecordId;
use checkout_capture_core::StoreError;
use checkout_capture_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current `SQLite` schema version for the capture store.
///
/// Version 1 lacked the `product_data` column; version 2 is the superset
/// schema. Opening a version 1 database migrates in place.
pub const SCHEMA_VERSION: i64 = 2;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` capture store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding captured field values.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or payload shape violation.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed capture store with WAL support.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex; individual
///   inserts are atomic, which is all the append-only log requires.
#[derive(Clone)]
pub struct SqliteCaptureStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCaptureStore {
    /// Opens an `SQLite`-backed capture store, migrating older schemas.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened,
    /// initialized, or migrated.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Appends one record inside a single insert statement.
    fn append_record(&self, record: &NewCaptureRecord) -> Result<RecordId, SqliteStoreError> {
        let (field_name, field_value, product_data) = encode_payload(&record.payload)?;
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        guard
            .execute(
                "INSERT INTO capture_records (identity, field_name, field_value, product_data, \
                 captured_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.identity.wire(),
                    field_name,
                    field_value,
                    product_data,
                    record.captured_at.as_unix_millis()
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let row_id = guard.last_insert_rowid();
        drop(guard);
        let raw = u64::try_from(row_id)
            .map_err(|_| SqliteStoreError::Corrupt("negative record id".to_string()))?;
        Ok(RecordId::new(raw))
    }

    /// Loads every stored record in insertion order.
    fn load_records(&self) -> Result<Vec<CaptureRecord>, SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let mut stmt = guard
            .prepare(
                "SELECT id, identity, field_name, field_value, product_data, captured_at FROM \
                 capture_records ORDER BY id",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                let identity: String = row.get(1)?;
                let field_name: Option<String> = row.get(2)?;
                let field_value: Option<String> = row.get(3)?;
                let product_data: Option<String> = row.get(4)?;
                let captured_at: i64 = row.get(5)?;
                Ok((id, identity, field_name, field_value, product_data, captured_at))
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut records = Vec::new();
        for row in rows {
            let (id, identity_raw, field_name, field_value, product_data, captured_at) =
                row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let raw_id = u64::try_from(id)
                .map_err(|_| SqliteStoreError::Corrupt(format!("negative record id: {id}")))?;
            let identity = Identity::parse_wire(&identity_raw).map_err(|err| {
                SqliteStoreError::Corrupt(format!("invalid stored identity: {err}"))
            })?;
            let payload = decode_payload(raw_id, field_name, field_value, product_data)?;
            records.push(CaptureRecord {
                record_id: RecordId::new(raw_id),
                identity,
                payload,
                captured_at: Timestamp::from_unix_millis(captured_at),
            });
        }
        drop(stmt);
        drop(guard);
        Ok(records)
    }

    /// Deletes every stored record.
    fn purge_records(&self) -> Result<u64, SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let removed = guard
            .execute("DELETE FROM capture_records", [])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        drop(guard);
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}

impl CaptureStore for SqliteCaptureStore {
    fn append(&self, record: NewCaptureRecord) -> Result<RecordId, StoreError> {
        self.append_record(&record).map_err(StoreError::from)
    }

    fn load_all(&self) -> Result<Vec<CaptureRecord>, StoreError> {
        self.load_records().map_err(StoreError::from)
    }

    fn purge(&self) -> Result<u64, StoreError> {
        self.purge_records().map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Payload Encoding
// ============================================================================

/// Splits a payload into its storage columns.
fn encode_payload(
    payload: &CapturePayload,
) -> Result<(Option<String>, Option<String>, Option<String>), SqliteStoreError> {
    match payload {
        CapturePayload::Field(observation) => Ok((
            Some(observation.name.clone()),
            Some(observation.value.clone()),
            None,
        )),
        CapturePayload::Order(snapshot) => {
            let json = serde_json::to_string(snapshot)
                .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
            Ok((None, None, Some(json)))
        }
    }
}

/// Rebuilds a payload from its storage columns, failing closed on shape
/// violations.
fn decode_payload(
    record_id: u64,
    field_name: Option<String>,
    field_value: Option<String>,
    product_data: Option<String>,
) -> Result<CapturePayload, SqliteStoreError> {
    match (field_name, field_value, product_data) {
        (Some(name), Some(value), None) => Ok(CapturePayload::Field(FieldObservation {
            name,
            value,
        })),
        (None, None, Some(json)) => {
            let snapshot: OrderSnapshot = serde_json::from_str(&json).map_err(|err| {
                SqliteStoreError::Corrupt(format!(
                    "invalid order payload for record {record_id}: {err}"
                ))
            })?;
            Ok(CapturePayload::Order(snapshot))
        }
        _ => Err(SqliteStoreError::Corrupt(format!(
            "ambiguous payload columns for record {record_id}"
        ))),
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    match path.parent() {
        // A bare filename resolves against the working directory.
        None => Ok(()),
        Some(parent) if parent.as_os_str().is_empty() => Ok(()),
        Some(parent) => std::fs::create_dir_all(parent)
            .map_err(|err| SqliteStoreError::Io(err.to_string())),
    }
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema, migrating older versions in place.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS capture_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    identity TEXT NOT NULL,
                    field_name TEXT,
                    field_value TEXT,
                    product_data TEXT,
                    captured_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_capture_records_identity
                    ON capture_records (identity);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(1) => migrate_v1_to_v2(&tx)?,
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Migration step: version 1 adds the structured order payload column.
fn migrate_v1_to_v2(tx: &rusqlite::Transaction<'_>) -> Result<(), SqliteStoreError> {
    tx.execute_batch("ALTER TABLE capture_records ADD COLUMN product_data TEXT;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute("UPDATE store_meta SET version = ?1", params![SCHEMA_VERSION])
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}
