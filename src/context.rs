//! Contexts: named binary state sources describing what part of the shell has focus.
//!
//! A context only signals when it becomes active or goes inactive. Deciding which
//! document is "the current notebook" is left to whoever drives the context.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};

pub mod focus;
pub mod global;
pub mod signal;
pub mod toggle;

pub use focus::{FocusArea, FocusChange, FocusContext, FocusedWidget};
pub use global::GlobalContext;
pub use signal::{ConnectionId, Signal};
pub use toggle::ToggleContext;

/// Binary state of a context (and the effective state of a status item).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextState {
    Active,
    Inactive,
}

impl ContextState {
    pub fn from_active(active: bool) -> Self {
        if active {
            ContextState::Active
        } else {
            ContextState::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == ContextState::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextState::Active => "active",
            ContextState::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a context's transition event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub new_state: ContextState,
}

/// Contract every context source implements.
///
/// Implementations must only emit on `state_changed` when the state actually
/// changes; repeated identical states are swallowed.
pub trait Context: Send + Sync {
    /// Unique, process-stable name.
    fn name(&self) -> &str;

    fn state(&self) -> ContextState;

    fn state_changed(&self) -> &Signal<StateChange>;

    /// Re-derive the state from the underlying source, emitting if it moved.
    fn refresh(&self) {}

    /// Release upstream subscriptions. Idempotent.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}

/// Owning handle the multiplexer keeps for each registered context.
pub type SharedContext = Arc<dyn Context>;

/// A context's current state.
///
/// The lock is held across the store and the emit so one context's emissions
/// always follow the order of its stores, whichever threads drive it. It is
/// re-entrant so listeners on the emitting thread may read or flip the context.
pub(crate) type StateCell = ReentrantMutex<Cell<ContextState>>;

pub(crate) fn state_cell(initial: ContextState) -> StateCell {
    ReentrantMutex::new(Cell::new(initial))
}

/// Move `state` to `next` and emit on `signal` if it changed.
pub(crate) fn transition(
    state: &StateCell,
    signal: &Signal<StateChange>,
    next: ContextState,
) -> bool {
    let current = state.lock();
    if current.get() == next {
        return false;
    }
    current.set(next);
    signal.emit(&StateChange { new_state: next });
    true
}

/// Data-pointer identity for trait objects (vtable pointers may differ).
pub(crate) fn same_instance(a: &SharedContext, b: &SharedContext) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}
