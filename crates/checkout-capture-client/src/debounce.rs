// crates/checkout-capture-client/src/debounce.rs
// ============================================================================
// Module: Field Change Debounce
// Description: Quiet-period collapsing of rapid field edits.
// Purpose: Guarantee at most one dispatch per field per quiet period.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! Each field edit bumps a per-field generation counter and arms a timer for
//! the quiet period. When the timer fires, the value is dispatched only if no
//! newer edit has bumped the generation in the meantime. The last edit in a
//! burst therefore wins, and earlier timers expire silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::dispatch::CaptureDispatcher;
use crate::dispatch::FieldCapture;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default quiet period between the last edit and dispatch.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

// ============================================================================
// SECTION: Emitter
// ============================================================================

/// Per-field debounce state.
struct FieldState {
    /// Edit generation; each edit bumps it.
    generation: u64,
    /// Latest observed value.
    value: String,
}

/// Debounced field change emitter.
///
/// # Invariants
/// - At most one dispatch happens per field per quiet period, carrying the
///   value of the latest edit.
/// - Values that are empty after trimming are never dispatched.
pub struct FieldChangeEmitter {
    /// Downstream capture dispatcher.
    dispatcher: Arc<dyn CaptureDispatcher>,
    /// Quiet period between the last edit and dispatch.
    quiet_period: Duration,
    /// Capture-scope token attached to every dispatch.
    token: String,
    /// Anonymous session identifier for guests.
    session_id: Option<String>,
    /// Per-field debounce state.
    fields: Arc<Mutex<HashMap<String, FieldState>>>,
}

impl FieldChangeEmitter {
    /// Builds an emitter with the default quiet period.
    #[must_use]
    pub fn new(
        dispatcher: Arc<dyn CaptureDispatcher>,
        token: String,
        session_id: Option<String>,
    ) -> Self {
        Self::with_quiet_period(dispatcher, token, session_id, DEFAULT_QUIET_PERIOD)
    }

    /// Builds an emitter with an explicit quiet period.
    #[must_use]
    pub fn with_quiet_period(
        dispatcher: Arc<dyn CaptureDispatcher>,
        token: String,
        session_id: Option<String>,
        quiet_period: Duration,
    ) -> Self {
        Self {
            dispatcher,
            quiet_period,
            token,
            session_id,
            fields: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Records a field edit and arms the quiet-period timer.
    ///
    /// Empty values still bump the generation, cancelling any armed timer
    /// for the field, but never dispatch.
    pub fn field_changed(&self, field_name: &str, field_value: &str) {
        let generation = {
            let Ok(mut fields) = self.fields.lock() else {
                return;
            };
            let state = fields.entry(field_name.to_string()).or_insert_with(|| FieldState {
                generation: 0,
                value: String::new(),
            });
            state.generation = state.generation.wrapping_add(1);
            state.value = field_value.to_string();
            state.generation
        };
        if field_value.trim().is_empty() {
            return;
        }
        let dispatcher = Arc::clone(&self.dispatcher);
        let fields = Arc::clone(&self.fields);
        let quiet_period = self.quiet_period;
        let token = self.token.clone();
        let session_id = self.session_id.clone();
        let field_name = field_name.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            let value = {
                let Ok(fields) = fields.lock() else {
                    return;
                };
                match fields.get(&field_name) {
                    Some(state) if state.generation == generation => state.value.clone(),
                    _ => return,
                }
            };
            let capture = FieldCapture {
                token,
                session_id,
                field_name,
                field_value: value,
            };
            // Delivery failures are the dispatcher's to report; the burst is
            // already consumed either way.
            let _ = dispatcher.dispatch(capture).await;
        });
    }
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

    use std::sync::Arc;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::DEFAULT_QUIET_PERIOD;
    use super::FieldChangeEmitter;
    use crate::dispatch::CaptureDispatcher;
    use crate::dispatch::DispatchError;
    use crate::dispatch::FieldCapture;

    /// Records every dispatched capture for assertions.
    struct RecordingDispatcher {
        captures: Mutex<Vec<FieldCapture>>,
    }

    impl RecordingDispatcher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                captures: Mutex::new(Vec::new()),
            })
        }

        fn captures(&self) -> Vec<FieldCapture> {
            self.captures.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl CaptureDispatcher for RecordingDispatcher {
        async fn dispatch(&self, capture: FieldCapture) -> Result<(), DispatchError> {
            self.captures.lock().expect("lock").push(capture);
            Ok(())
        }
    }

    fn emitter(dispatcher: Arc<RecordingDispatcher>) -> FieldChangeEmitter {
        FieldChangeEmitter::new(dispatcher, "token".to_string(), Some("s1".to_string()))
    }

    /// Sleeps past the quiet period so armed timers fire.
    async fn settle() {
        tokio::time::sleep(DEFAULT_QUIET_PERIOD + Duration::from_millis(50)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_to_one_dispatch_with_final_value() {
        let dispatcher = RecordingDispatcher::new();
        let emitter = emitter(Arc::clone(&dispatcher));
        emitter.field_changed("billing_email", "a");
        emitter.field_changed("billing_email", "ad");
        emitter.field_changed("billing_email", "ada@example.com");
        settle().await;
        let captures = dispatcher.captures();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].field_value, "ada@example.com");
        assert_eq!(captures[0].session_id.as_deref(), Some("s1"));
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_fields_dispatch_independently() {
        let dispatcher = RecordingDispatcher::new();
        let emitter = emitter(Arc::clone(&dispatcher));
        emitter.field_changed("billing_email", "ada@example.com");
        emitter.field_changed("billing_city", "London");
        settle().await;
        let mut names: Vec<_> =
            dispatcher.captures().into_iter().map(|capture| capture.field_name).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["billing_city", "billing_email"]);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_values_are_not_dispatched() {
        let dispatcher = RecordingDispatcher::new();
        let emitter = emitter(Arc::clone(&dispatcher));
        emitter.field_changed("billing_email", "   ");
        settle().await;
        assert!(dispatcher.captures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_a_field_cancels_the_armed_timer() {
        let dispatcher = RecordingDispatcher::new();
        let emitter = emitter(Arc::clone(&dispatcher));
        emitter.field_changed("billing_email", "ada@example.com");
        emitter.field_changed("billing_email", "");
        settle().await;
        assert!(dispatcher.captures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn separate_bursts_dispatch_separately() {
        let dispatcher = RecordingDispatcher::new();
        let emitter = emitter(Arc::clone(&dispatcher));
        emitter.field_changed("billing_city", "Lyon");
        settle().await;
        emitter.field_changed("billing_city", "Paris");
        settle().await;
        let captures = dispatcher.captures();
        assert_eq!(captures.len(), 2);
        assert_eq!(captures[1].field_value, "Paris");
    }
}
