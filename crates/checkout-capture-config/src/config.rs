// crates/checkout-capture-config/src/config.rs
// ============================================================================
// Module: Checkout Capture Configuration
// Description: Configuration loading and validation for the capture service.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: checkout-capture-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: a server that cannot prove
//! it has two distinct, sufficiently long signing secrets does not start.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use checkout_capture_store_sqlite::SqliteJournalMode;
use checkout_capture_store_sqlite::SqliteStoreConfig;
use checkout_capture_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "checkout-capture.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "CHECKOUT_CAPTURE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum length of a signing secret in bytes.
pub(crate) const MIN_SECRET_LENGTH: usize = 16;
/// Maximum length of a signing secret in bytes.
pub(crate) const MAX_SECRET_LENGTH: usize = 256;
/// Maximum length of the export filename.
pub(crate) const MAX_EXPORT_FILENAME_LENGTH: usize = 128;
/// Maximum length of the export worksheet name (XLSX format limit is 31).
pub(crate) const MAX_WORKSHEET_NAME_LENGTH: usize = 31;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Checkout capture service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Server configuration. Required; there is no usable default without
    /// auth secrets.
    pub server: ServerConfig,
    /// Capture store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Export configuration.
    #[serde(default)]
    pub export: ExportConfig,
}

impl CaptureConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.export.validate()?;
        Ok(())
    }
}

/// Server configuration for the capture HTTP surface.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Anti-forgery token configuration.
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let bind = self.bind.trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("server.bind must be non-empty".to_string()));
        }
        let _: SocketAddr = bind
            .parse()
            .map_err(|_| ConfigError::Invalid("server.bind is not a valid address".to_string()))?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        self.auth.validate()?;
        Ok(())
    }
}

/// Anti-forgery token configuration.
///
/// # Invariants
/// - Both secrets are at least [`MIN_SECRET_LENGTH`] bytes.
/// - Capture and export secrets are distinct, so a leaked capture token can
///   never authorize an export.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret behind capture tokens (field capture and order hooks).
    pub capture_secret: String,
    /// Secret behind export and purge tokens.
    pub export_secret: String,
}

impl AuthConfig {
    /// Validates auth secrets.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_secret("server.auth.capture_secret", &self.capture_secret)?;
        validate_secret("server.auth.export_secret", &self.export_secret)?;
        if self.capture_secret == self.export_secret {
            return Err(ConfigError::Invalid(
                "server.auth capture_secret and export_secret must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Capture store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Capture store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub backend: StoreBackend,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            StoreBackend::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreBackend::Sqlite => {
                let path = self
                    .path
                    .as_ref()
                    .ok_or_else(|| ConfigError::Invalid("sqlite store requires path".to_string()))?;
                validate_store_path(path)?;
                if self.busy_timeout_ms == 0 {
                    return Err(ConfigError::Invalid(
                        "store.busy_timeout_ms must be greater than zero".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Builds the `SQLite` store configuration for the sqlite backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the backend is not sqlite or no path is
    /// configured.
    pub fn to_sqlite_config(&self) -> Result<SqliteStoreConfig, ConfigError> {
        if self.backend != StoreBackend::Sqlite {
            return Err(ConfigError::Invalid("store backend is not sqlite".to_string()));
        }
        let path = self
            .path
            .clone()
            .ok_or_else(|| ConfigError::Invalid("sqlite store requires path".to_string()))?;
        Ok(SqliteStoreConfig {
            path,
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        })
    }
}

/// Export configuration for spreadsheet downloads.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Download filename offered to the client.
    #[serde(default = "default_export_filename")]
    pub filename: String,
    /// Worksheet name inside the workbook.
    #[serde(default = "default_worksheet_name")]
    pub worksheet: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            filename: default_export_filename(),
            worksheet: default_worksheet_name(),
        }
    }
}

impl ExportConfig {
    /// Validates export configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let filename = self.filename.trim();
        if filename.is_empty() {
            return Err(ConfigError::Invalid("export.filename must be non-empty".to_string()));
        }
        if filename.len() > MAX_EXPORT_FILENAME_LENGTH {
            return Err(ConfigError::Invalid("export.filename exceeds max length".to_string()));
        }
        if filename.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(
                "export.filename must not contain path separators".to_string(),
            ));
        }
        if !filename.ends_with(".xlsx") {
            return Err(ConfigError::Invalid("export.filename must end in .xlsx".to_string()));
        }
        let worksheet = self.worksheet.trim();
        if worksheet.is_empty() {
            return Err(ConfigError::Invalid("export.worksheet must be non-empty".to_string()));
        }
        if worksheet.len() > MAX_WORKSHEET_NAME_LENGTH {
            return Err(ConfigError::Invalid("export.worksheet exceeds max length".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a store database path against length constraints.
fn validate_store_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid("store.path must be non-empty".to_string()));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("store.path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("store.path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a signing secret against length and whitespace constraints.
fn validate_secret(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim() != value {
        return Err(ConfigError::Invalid(format!(
            "{field} must not have leading or trailing whitespace"
        )));
    }
    if value.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} must be at least {MIN_SECRET_LENGTH} bytes"
        )));
    }
    if value.len() > MAX_SECRET_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Default HTTP bind address.
fn default_bind() -> String {
    "127.0.0.1:8380".to_string()
}

/// Default maximum request body size in bytes.
pub(crate) const fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Default store busy timeout in milliseconds.
pub(crate) const fn default_store_busy_timeout_ms() -> u64 {
    5_000
}

/// Default export download filename.
fn default_export_filename() -> String {
    "checkout-data.xlsx".to_string()
}

/// Default export worksheet name.
fn default_worksheet_name() -> String {
    "Checkout Data".to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
