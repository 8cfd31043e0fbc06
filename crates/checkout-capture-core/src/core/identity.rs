// crates/checkout-capture-core/src/core/identity.rs
// ============================================================================
// Module: Capture Identities
// Description: Opaque grouping keys for capture records.
// Purpose: Unify user, session, and order identity under one stable wire form.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Capture records are grouped by an opaque identity: the authenticated user
//! id when one exists, an anonymous session id otherwise, or an order id for
//! checkout-completion snapshots. The wire form (`user:<n>`, `session:<s>`,
//! `order:<n>`) is stable: it is what the store persists and what exports
//! render, so changing it is a schema migration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identity construction and parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Numeric identity component was zero or unparsable.
    #[error("invalid identity number: {0}")]
    InvalidNumber(String),
    /// Session identity component was empty.
    #[error("empty session identity")]
    EmptySession,
    /// Wire form did not match any known identity kind.
    #[error("unknown identity wire form: {0}")]
    UnknownWireForm(String),
}

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Opaque grouping key for capture records.
///
/// # Invariants
/// - Numeric identities are always >= 1 (non-zero, 1-based).
/// - Session identities are non-empty strings.
/// - The wire form round-trips through [`Identity::wire`] and
///   [`Identity::parse_wire`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Identity {
    /// Authenticated user identity.
    User(NonZeroU64),
    /// Anonymous browser session identity.
    Session(String),
    /// Finalized order identity.
    Order(NonZeroU64),
}

impl Identity {
    /// Creates a user identity from a raw value (returns `None` if zero).
    #[must_use]
    pub fn user(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self::User)
    }

    /// Creates a session identity.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptySession`] when the session id is empty.
    pub fn session(id: impl Into<String>) -> Result<Self, IdentityError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentityError::EmptySession);
        }
        Ok(Self::Session(id))
    }

    /// Creates an order identity from a raw value (returns `None` if zero).
    #[must_use]
    pub fn order(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self::Order)
    }

    /// Returns the stable wire form of the identity.
    #[must_use]
    pub fn wire(&self) -> String {
        match self {
            Self::User(id) => format!("user:{id}"),
            Self::Session(id) => format!("session:{id}"),
            Self::Order(id) => format!("order:{id}"),
        }
    }

    /// Parses an identity from its stable wire form.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when the prefix is unknown, a numeric
    /// component is zero or unparsable, or a session component is empty.
    pub fn parse_wire(wire: &str) -> Result<Self, IdentityError> {
        let Some((kind, rest)) = wire.split_once(':') else {
            return Err(IdentityError::UnknownWireForm(wire.to_string()));
        };
        match kind {
            "user" => parse_nonzero(rest).map(Self::User),
            "session" => Self::session(rest),
            "order" => parse_nonzero(rest).map(Self::Order),
            _ => Err(IdentityError::UnknownWireForm(wire.to_string())),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.wire()
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(wire: String) -> Result<Self, Self::Error> {
        Self::parse_wire(&wire)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a non-zero numeric identity component.
fn parse_nonzero(raw: &str) -> Result<NonZeroU64, IdentityError> {
    raw.parse::<u64>()
        .ok()
        .and_then(NonZeroU64::new)
        .ok_or_else(|| IdentityError::InvalidNumber(raw.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
