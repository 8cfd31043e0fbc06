// crates/checkout-capture-server/src/lib.rs
// ============================================================================
// Module: Checkout Capture Server Crate
// Description: HTTP capture surface, token enforcement, and audit logging.
// Purpose: Expose capture, order hook, export, and purge endpoints over HTTP.
// Dependencies: axum, tokio, checkout-capture-core, checkout-capture-export
// ============================================================================

//! ## Overview
//! The capture server exposes a small JSON surface: a bootstrap endpoint that
//! issues anti-forgery tokens to checkout pages, a background field capture
//! endpoint, an order completion hook, and admin export/purge operations.
//! Every state-changing endpoint verifies a derived token before touching the
//! store, and every decision emits an audit event.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::CaptureAuditEvent;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use auth::AuthError;
pub use auth::TokenKeys;
pub use auth::TokenScope;
pub use auth::token_fingerprint;
pub use server::ADMIN_SESSION_KEY;
pub use server::CaptureServer;
pub use server::CaptureServerError;
pub use server::DEBOUNCE_INTERVAL_MS;
pub use server::build_capture_store;
