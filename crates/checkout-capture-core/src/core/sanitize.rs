// crates/checkout-capture-core/src/core/sanitize.rs
// ============================================================================
// Module: Input Sanitization
// Description: Scrubs checkout form input before storage.
// Purpose: Strip markup and control characters from untrusted field data.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Field names and values arrive from untrusted browser input and are
//! scrubbed before any row is written: markup tags are stripped, control
//! characters removed, whitespace collapsed and trimmed, and lengths capped.
//! A field name that is empty after scrubbing is a validation error; values
//! may legitimately be empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum sanitized field name length in characters.
pub const MAX_FIELD_NAME_CHARS: usize = 255;
/// Maximum sanitized field value length in characters.
pub const MAX_FIELD_VALUE_CHARS: usize = 4096;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sanitization errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    /// Field name was empty after scrubbing.
    #[error("field name empty after sanitization")]
    EmptyFieldName,
}

// ============================================================================
// SECTION: Sanitizers
// ============================================================================

/// Sanitizes a field name.
///
/// # Errors
///
/// Returns [`SanitizeError::EmptyFieldName`] when nothing survives the
/// scrub.
pub fn sanitize_field_name(raw: &str) -> Result<String, SanitizeError> {
    let name = scrub(raw, MAX_FIELD_NAME_CHARS);
    if name.is_empty() {
        return Err(SanitizeError::EmptyFieldName);
    }
    Ok(name)
}

/// Sanitizes a field value. Empty results are allowed.
#[must_use]
pub fn sanitize_field_value(raw: &str) -> String {
    scrub(raw, MAX_FIELD_VALUE_CHARS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Strips markup, drops control characters, collapses whitespace, and caps
/// the result at `max_chars` characters.
fn scrub(raw: &str, max_chars: usize) -> String {
    let stripped = strip_markup(raw);
    let cleaned: String = stripped.chars().filter(|c| !c.is_control()).collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

/// Removes `<...>` markup spans. An unterminated tag drops the remainder.
fn strip_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
