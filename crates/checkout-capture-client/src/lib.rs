// crates/checkout-capture-client/src/lib.rs
// ============================================================================
// Module: Checkout Capture Client Crate
// Description: Debounced field capture dispatch for checkout pages.
// Purpose: Collapse rapid field edits into single capture requests.
// Dependencies: async-trait, reqwest, tokio
// ============================================================================

//! ## Overview
//! The client mirrors what a checkout page does while the shopper types:
//! every field edit arms a quiet-period timer, and only the value present
//! when the timer fires is dispatched to the capture endpoint. A burst of
//! keystrokes therefore produces exactly one capture request carrying the
//! final value. Empty values are never dispatched.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod debounce;
pub mod dispatch;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use debounce::DEFAULT_QUIET_PERIOD;
pub use debounce::FieldChangeEmitter;
pub use dispatch::CaptureDispatcher;
pub use dispatch::DEFAULT_DISPATCH_TIMEOUT;
pub use dispatch::DispatchError;
pub use dispatch::FieldCapture;
pub use dispatch::HttpCaptureDispatcher;
pub use dispatch::HttpDispatcherConfig;
