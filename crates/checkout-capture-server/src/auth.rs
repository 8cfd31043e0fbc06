// crates/checkout-capture-server/src/auth.rs
// ============================================================================
// Module: Capture Token Enforcement
// Description: Derived anti-forgery tokens for capture and admin endpoints.
// Purpose: Provide strict, fail-closed token issuance and verification.
// Dependencies: checkout-capture-config, sha2, subtle
// ============================================================================

//! ## Overview
//! Tokens are derived, not stored: a token is the hex SHA-256 digest of the
//! scope label, the scope's secret, and the caller's session key, joined by a
//! separator byte that cannot appear in any component. Verification re-derives
//! the expected token and compares in constant time. Audit events only ever
//! carry a token fingerprint, never the token itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use checkout_capture_config::AuthConfig;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Separator byte between token derivation components.
const DERIVATION_SEPARATOR: u8 = 0x1f;
/// Maximum accepted token length in bytes.
const MAX_TOKEN_LENGTH: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Token verification errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
}

// ============================================================================
// SECTION: Token Scope
// ============================================================================

/// Scope a token is valid for.
///
/// Capture tokens authorize field capture and order hooks; export tokens
/// authorize export and purge. The scopes derive from distinct secrets, so
/// neither token can stand in for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    /// Field capture and order completion hooks.
    Capture,
    /// Export and purge administration.
    Export,
}

impl TokenScope {
    /// Returns the stable derivation label for the scope.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Export => "export",
        }
    }
}

// ============================================================================
// SECTION: Token Keys
// ============================================================================

/// Token derivation keys for both scopes.
pub struct TokenKeys {
    /// Secret behind capture-scope tokens.
    capture_secret: String,
    /// Secret behind export-scope tokens.
    export_secret: String,
}

impl TokenKeys {
    /// Builds token keys from validated auth configuration.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            capture_secret: config.capture_secret.clone(),
            export_secret: config.export_secret.clone(),
        }
    }

    /// Derives the token for a scope and session key.
    #[must_use]
    pub fn derive(&self, scope: TokenScope, session_key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(scope.label().as_bytes());
        hasher.update([DERIVATION_SEPARATOR]);
        hasher.update(self.secret(scope).as_bytes());
        hasher.update([DERIVATION_SEPARATOR]);
        hasher.update(session_key.as_bytes());
        hex_encode(&hasher.finalize())
    }

    /// Verifies a presented token for a scope and session key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when the token is empty, too
    /// long, or does not match the derived token.
    pub fn verify(
        &self,
        scope: TokenScope,
        session_key: &str,
        presented: &str,
    ) -> Result<(), AuthError> {
        if presented.is_empty() {
            return Err(AuthError::Unauthenticated("missing token".to_string()));
        }
        if presented.len() > MAX_TOKEN_LENGTH {
            return Err(AuthError::Unauthenticated("token too long".to_string()));
        }
        let expected = self.derive(scope, session_key);
        if constant_time_eq(expected.as_bytes(), presented.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::Unauthenticated("invalid token".to_string()))
        }
    }

    /// Returns the secret for a scope.
    const fn secret(&self, scope: TokenScope) -> &String {
        match scope {
            TokenScope::Capture => &self.capture_secret,
            TokenScope::Export => &self.export_secret,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the SHA-256 fingerprint of a token for audit logging.
#[must_use]
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Compares two byte slices in constant time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use checkout_capture_config::AuthConfig;

    use super::AuthError;
    use super::TokenKeys;
    use super::TokenScope;
    use super::token_fingerprint;

    fn keys() -> TokenKeys {
        TokenKeys::from_config(&AuthConfig {
            capture_secret: "capture-secret-0123456789".to_string(),
            export_secret: "export-secret-0123456789".to_string(),
        })
    }

    #[test]
    fn derived_token_verifies_for_its_scope() {
        let keys = keys();
        let token = keys.derive(TokenScope::Capture, "session:abc");
        keys.verify(TokenScope::Capture, "session:abc", &token).expect("verify");
    }

    #[test]
    fn token_is_bound_to_session_key() {
        let keys = keys();
        let token = keys.derive(TokenScope::Capture, "session:abc");
        assert!(matches!(
            keys.verify(TokenScope::Capture, "session:other", &token),
            Err(AuthError::Unauthenticated(_))
        ));
    }

    #[test]
    fn capture_token_cannot_authorize_export() {
        let keys = keys();
        let token = keys.derive(TokenScope::Capture, "session:abc");
        assert!(keys.verify(TokenScope::Export, "session:abc", &token).is_err());
    }

    #[test]
    fn empty_token_is_rejected() {
        let keys = keys();
        assert!(keys.verify(TokenScope::Capture, "session:abc", "").is_err());
    }

    #[test]
    fn oversized_token_is_rejected() {
        let keys = keys();
        let oversized = "a".repeat(512);
        assert!(keys.verify(TokenScope::Capture, "session:abc", &oversized).is_err());
    }

    #[test]
    fn fingerprint_differs_from_token() {
        let keys = keys();
        let token = keys.derive(TokenScope::Export, "session:abc");
        let fingerprint = token_fingerprint(&token);
        assert_ne!(fingerprint, token);
        assert_eq!(fingerprint.len(), 64);
    }
}
