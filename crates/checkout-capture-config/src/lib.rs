// crates/checkout-capture-config/src/lib.rs
// ============================================================================
// Module: Checkout Capture Configuration Crate
// Description: Configuration loading and validation.
// Purpose: Provide strict, fail-closed configuration for all binaries.
// Dependencies: checkout-capture-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Strict TOML configuration for the checkout capture service. Every section
//! validates fail-closed at load time so binaries never start with a partial
//! or unsafe configuration.

pub mod config;

pub use config::AuthConfig;
pub use config::CaptureConfig;
pub use config::ConfigError;
pub use config::ExportConfig;
pub use config::ServerConfig;
pub use config::StoreBackend;
pub use config::StoreConfig;
