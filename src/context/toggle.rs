//! Manually driven context, the reference implementation of [`Context`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::context::{
    state_cell, transition, Context, ContextState, Signal, StateCell, StateChange,
};

/// A context whose state is set directly by its owner.
///
/// Hand an `Arc<ToggleContext>` to the manager and keep a clone to drive it.
pub struct ToggleContext {
    name: String,
    state: StateCell,
    changed: Signal<StateChange>,
    disposed: AtomicBool,
}

impl ToggleContext {
    pub fn new(name: impl Into<String>, initial: ContextState) -> Self {
        Self {
            name: name.into(),
            state: state_cell(initial),
            changed: Signal::new(),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn shared(name: impl Into<String>, initial: ContextState) -> Arc<Self> {
        Arc::new(Self::new(name, initial))
    }

    /// Set the state, emitting only if it changed. No-op once disposed.
    pub fn set_state(&self, next: ContextState) -> bool {
        if self.is_disposed() {
            return false;
        }
        transition(&self.state, &self.changed, next)
    }

    pub fn activate(&self) -> bool {
        self.set_state(ContextState::Active)
    }

    pub fn deactivate(&self) -> bool {
        self.set_state(ContextState::Inactive)
    }
}

impl Context for ToggleContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ContextState {
        self.state.lock().get()
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
