// crates/checkout-capture-server/src/audit.rs
// ============================================================================
// Module: Capture Audit Logging
// Description: Structured audit events for capture server decisions.
// Purpose: Record allow/deny outcomes for every endpoint as JSON lines.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every endpoint decision produces one audit event: the operation, the
//! outcome, the identity involved, and for denied requests the reason. Token
//! material never appears in events; only a SHA-256 fingerprint does.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use serde::Serialize;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Capture audit event payload.
#[derive(Debug, Serialize)]
pub struct CaptureAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// Endpoint operation name.
    operation: &'static str,
    /// Identity wire form when one was resolved.
    identity: Option<String>,
    /// Token fingerprint (sha256) when a token was presented.
    token_fingerprint: Option<String>,
    /// Failure reason (for deny events).
    reason: Option<String>,
}

impl CaptureAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(
        operation: &'static str,
        identity: Option<String>,
        token_fingerprint: Option<String>,
    ) -> Self {
        Self {
            event: "capture_request",
            decision: "allow",
            operation,
            identity,
            token_fingerprint,
            reason: None,
        }
    }

    /// Builds a deny event.
    #[must_use]
    pub fn denied(
        operation: &'static str,
        identity: Option<String>,
        token_fingerprint: Option<String>,
        reason: &str,
    ) -> Self {
        Self {
            event: "capture_request",
            decision: "deny",
            operation,
            identity,
            token_fingerprint,
            reason: Some(reason.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for capture server events.
pub trait AuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &CaptureAuditEvent);
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &CaptureAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &CaptureAuditEvent) {}
}
