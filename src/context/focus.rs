//! Focus-tracking contexts.
//!
//! The host shell publishes which main-area widget currently has focus through a
//! [`FocusArea`]. A [`FocusContext`] is active while that widget satisfies its
//! predicate, e.g. "is a notebook" or "is a console".

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{
    state_cell, transition, ConnectionId, Context, ContextState, Signal, StateCell, StateChange,
};

/// The widget currently holding focus in the main area.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FocusedWidget {
    pub id: String,
    /// Document or panel type: `notebook`, `console`, `terminal`, `editor`, ...
    pub kind: String,
}

impl FocusedWidget {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusChange {
    pub old: Option<FocusedWidget>,
    pub new: Option<FocusedWidget>,
}

/// Source of "current widget changed" notifications.
pub struct FocusArea {
    current: ReentrantMutex<RefCell<Option<FocusedWidget>>>,
    changed: Signal<FocusChange>,
}

impl Default for FocusArea {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusArea {
    pub fn new() -> Self {
        Self {
            current: ReentrantMutex::new(RefCell::new(None)),
            changed: Signal::new(),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn current(&self) -> Option<FocusedWidget> {
        self.current.lock().borrow().clone()
    }

    pub fn current_changed(&self) -> &Signal<FocusChange> {
        &self.changed
    }

    /// Replace the focused widget, emitting if it differs from the previous one.
    ///
    /// Emissions follow the order of the stores; listeners may refocus re-entrantly.
    pub fn set_current(&self, widget: Option<FocusedWidget>) -> bool {
        let current = self.current.lock();
        if *current.borrow() == widget {
            return false;
        }
        let old = current.replace(widget.clone());
        self.changed.emit(&FocusChange { old, new: widget });
        true
    }

    pub fn focus(&self, id: impl Into<String>, kind: impl Into<String>) -> bool {
        self.set_current(Some(FocusedWidget::new(id, kind)))
    }

    pub fn clear(&self) -> bool {
        self.set_current(None)
    }
}

type Matcher = Arc<dyn Fn(&FocusedWidget) -> bool + Send + Sync>;

/// Context that is active while the focused widget matches a predicate.
pub struct FocusContext {
    name: String,
    area: Arc<FocusArea>,
    matcher: Matcher,
    state: Arc<StateCell>,
    changed: Signal<StateChange>,
    connection: Mutex<Option<ConnectionId>>,
    disposed: AtomicBool,
}

impl FocusContext {
    pub fn new<F>(name: impl Into<String>, area: Arc<FocusArea>, matcher: F) -> Self
    where
        F: Fn(&FocusedWidget) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let matcher: Matcher = Arc::new(matcher);
        let initial = evaluate(&matcher, area.current().as_ref());
        let state = Arc::new(state_cell(initial));
        let changed = Signal::new();

        let connection = {
            let matcher = matcher.clone();
            let state = state.clone();
            let changed = changed.clone();
            let name = name.clone();
            area.current_changed().connect(move |change: &FocusChange| {
                let next = evaluate(&matcher, change.new.as_ref());
                if transition(&state, &changed, next) {
                    debug!(context = %name, state = %next, "Focus context changed");
                }
            })
        };

        Self {
            name,
            area,
            matcher,
            state,
            changed,
            connection: Mutex::new(Some(connection)),
            disposed: AtomicBool::new(false),
        }
    }

    /// Context active while a widget of `kind` has focus.
    pub fn for_kind(name: impl Into<String>, area: Arc<FocusArea>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::new(name, area, move |widget| widget.kind == kind)
    }

    pub fn shared_for_kind(
        name: impl Into<String>,
        area: Arc<FocusArea>,
        kind: impl Into<String>,
    ) -> Arc<Self> {
        Arc::new(Self::for_kind(name, area, kind))
    }
}

fn evaluate(matcher: &Matcher, widget: Option<&FocusedWidget>) -> ContextState {
    ContextState::from_active(widget.map_or(false, |w| matcher(w)))
}

impl Context for FocusContext {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> ContextState {
        self.state.lock().get()
    }

    fn state_changed(&self) -> &Signal<StateChange> {
        &self.changed
    }

    fn refresh(&self) {
        if self.is_disposed() {
            return;
        }
        let next = evaluate(&self.matcher, self.area.current().as_ref());
        transition(&self.state, &self.changed, next);
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(id) = self.connection.lock().take() {
            self.area.current_changed().disconnect(id);
        }
        self.changed.close();
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}
