//! The always-on context.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::{Context, ContextState, Signal, StateChange};

pub const GLOBAL_CONTEXT: &str = "global";

/// Permanently active context named `"global"`; it never emits.
///
/// Items that should always be visible list it in their interest set.
#[derive(Default)]
pub struct GlobalContext {
    changed: Signal<StateChange>,
    disposed: AtomicBool,
}

impl GlobalContext {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Context for GlobalContext {
    fn name(&self) -> &str {
        GLOBAL_CONTEXT
    }

    fn state(&self) -> ContextState {
        ContextState::Active
    }

    fn state_changed(&self) -> &Signal<StateChange> {
        &self.changed
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.changed.close();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
