//! Context manager: maps status items to the contexts they care about and
//! reports batched visibility flips as contexts change.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::{ConnectionId, Context, ContextState, SharedContext, Signal};
use crate::error::ContextError;
use crate::mux::{ContextChange, ContextMultiplexer};

/// Registration request for a display item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub id: String,
    /// Names of the contexts the item depends on. Unknown names are allowed.
    pub contexts: Vec<String>,
}

impl ItemSpec {
    pub fn new<I, S>(id: impl Into<String>, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            contexts: contexts.into_iter().map(Into::into).collect(),
        }
    }
}

/// Batched visibility change: every item that flipped to `new_state` in one
/// context transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsChanged {
    pub new_state: ContextState,
    pub items: Vec<String>,
}

struct ItemEntry {
    id: String,
    interests: BTreeSet<String>,
    state: ContextState,
}

/// Everything the transition handler mutates.
///
/// Item slots are never reused, so slot order is registration order and the
/// reverse index yields dependents deterministically.
#[derive(Default)]
struct ManagerState {
    active: HashSet<String>,
    slots: Vec<Option<ItemEntry>>,
    by_id: HashMap<String, usize>,
    dependents: HashMap<String, BTreeSet<usize>>,
    disposed: bool,
}

impl ManagerState {
    fn evaluate(&self, interests: &BTreeSet<String>) -> ContextState {
        ContextState::from_active(interests.iter().any(|name| self.active.contains(name)))
    }

    fn insert_item(&mut self, spec: ItemSpec) -> ContextState {
        let interests: BTreeSet<String> = spec.contexts.into_iter().collect();
        let state = self.evaluate(&interests);

        let slot = match self.by_id.get(&spec.id).copied() {
            Some(slot) => {
                if let Some(previous) = self.slots[slot].take() {
                    self.unindex(slot, &previous.interests);
                }
                slot
            }
            None => {
                let slot = self.slots.len();
                self.slots.push(None);
                self.by_id.insert(spec.id.clone(), slot);
                slot
            }
        };

        for name in &interests {
            self.dependents.entry(name.clone()).or_default().insert(slot);
        }
        self.slots[slot] = Some(ItemEntry {
            id: spec.id,
            interests,
            state,
        });
        state
    }

    fn remove_item(&mut self, id: &str) -> bool {
        let Some(slot) = self.by_id.remove(id) else {
            return false;
        };
        if let Some(entry) = self.slots[slot].take() {
            self.unindex(slot, &entry.interests);
        }
        true
    }

    fn unindex(&mut self, slot: usize, interests: &BTreeSet<String>) {
        for name in interests {
            if let Some(set) = self.dependents.get_mut(name) {
                set.remove(&slot);
                if set.is_empty() {
                    self.dependents.remove(name);
                }
            }
        }
    }

    /// Apply one tagged transition and return the batches it produces,
    /// became-active first.
    fn apply(&mut self, change: &ContextChange) -> Vec<ItemsChanged> {
        if change.new_state.is_active() {
            self.active.insert(change.context.clone());
        } else {
            self.active.remove(&change.context);
        }

        let affected: Vec<usize> = self
            .dependents
            .get(&change.context)
            .map(|slots| slots.iter().copied().collect())
            .unwrap_or_default();

        let mut became_active = Vec::new();
        let mut became_inactive = Vec::new();
        for slot in affected {
            let next = match &self.slots[slot] {
                Some(entry) => self.evaluate(&entry.interests),
                None => continue,
            };
            let Some(entry) = self.slots[slot].as_mut() else {
                continue;
            };
            if entry.state == next {
                continue;
            }
            entry.state = next;
            match next {
                ContextState::Active => became_active.push(entry.id.clone()),
                ContextState::Inactive => became_inactive.push(entry.id.clone()),
            }
        }

        let mut batches = Vec::with_capacity(2);
        if !became_active.is_empty() {
            batches.push(ItemsChanged {
                new_state: ContextState::Active,
                items: became_active,
            });
        }
        if !became_inactive.is_empty() {
            batches.push(ItemsChanged {
                new_state: ContextState::Inactive,
                items: became_inactive,
            });
        }
        batches
    }

    fn item_state(&self, id: &str) -> Option<ContextState> {
        let slot = *self.by_id.get(id)?;
        self.slots[slot].as_ref().map(|entry| entry.state)
    }

    fn item_ids(&self) -> Vec<String> {
        self.slots
            .iter()
            .flatten()
            .map(|entry| entry.id.clone())
            .collect()
    }
}

/// Run one change through the state and publish the resulting batches.
///
/// The state lock is released before listeners run.
fn process(state: &Mutex<ManagerState>, items_changed: &Signal<ItemsChanged>, change: &ContextChange) {
    let batches = {
        let mut state = state.lock();
        if state.disposed {
            return;
        }
        state.apply(change)
    };
    for batch in &batches {
        debug!(
            context = %change.context,
            state = %batch.new_state,
            items = batch.items.len(),
            "Items changed"
        );
        items_changed.emit(batch);
    }
}

/// Aggregates context transitions into per-item visibility.
///
/// Invariant: an item is active iff at least one context in its interest set is
/// currently active.
pub struct ContextManager {
    mux: ContextMultiplexer,
    state: Arc<Mutex<ManagerState>>,
    items_changed: Signal<ItemsChanged>,
    connection: ConnectionId,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextManager {
    pub fn new() -> Self {
        let mux = ContextMultiplexer::new();
        let state = Arc::new(Mutex::new(ManagerState::default()));
        let items_changed = Signal::new();

        let connection = {
            let state = state.clone();
            let items_changed = items_changed.clone();
            mux.changed().connect(move |change: &ContextChange| {
                process(&state, &items_changed, change)
            })
        };

        Self {
            mux,
            state,
            items_changed,
            connection,
        }
    }

    /// Batched visibility changes; at most two per context transition.
    pub fn items_changed(&self) -> &Signal<ItemsChanged> {
        &self.items_changed
    }

    /// Register a context and import its current state.
    ///
    /// The import goes through the transition path, so items registered earlier
    /// flip (with events) if the new context changes their classification. This
    /// also applies when a name is re-registered with a new instance. When called
    /// from an `items_changed` listener the import is queued behind the change
    /// being dispatched, like any other transition.
    pub fn add_context(&self, context: SharedContext) -> Result<bool, ContextError> {
        self.ensure_live()?;
        let replaced = self.mux.add(context.clone())?;
        let import = ContextChange {
            context: context.name().to_string(),
            new_state: context.state(),
        };
        self.mux.inject(import);
        Ok(replaced)
    }

    pub fn has_context(&self, name: &str) -> bool {
        self.mux.has(name)
    }

    pub fn context(&self, name: &str) -> Result<SharedContext, ContextError> {
        self.mux.get(name)
    }

    pub fn context_names(&self) -> Vec<String> {
        self.mux.names()
    }

    /// Register (or overwrite) an item and return its initial effective state.
    ///
    /// No event is emitted for the initial value or for an overwrite.
    pub fn add_item(&self, spec: ItemSpec) -> Result<ContextState, ContextError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(ContextError::UseAfterDispose("ContextManager"));
        }
        let id = spec.id.clone();
        let initial = state.insert_item(spec);
        info!(item = %id, state = %initial, "Item registered");
        Ok(initial)
    }

    /// Drop an item. Returns whether it was registered. Emits nothing.
    pub fn remove_item(&self, id: &str) -> Result<bool, ContextError> {
        let mut state = self.state.lock();
        if state.disposed {
            return Err(ContextError::UseAfterDispose("ContextManager"));
        }
        Ok(state.remove_item(id))
    }

    pub fn item_state(&self, id: &str) -> Option<ContextState> {
        self.state.lock().item_state(id)
    }

    /// Registered item ids in registration order.
    pub fn items(&self) -> Vec<String> {
        self.state.lock().item_ids()
    }

    /// Names of the currently active contexts, sorted.
    pub fn active_contexts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().active.iter().cloned().collect();
        names.sort();
        names
    }

    /// Ask every context to re-derive its state.
    pub fn refresh(&self) -> Result<(), ContextError> {
        self.ensure_live()?;
        self.mux.refresh()
    }

    /// Dispose the multiplexer (and with it every context). Idempotent.
    pub fn dispose(&self) {
        {
            let mut state = self.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
        }
        self.mux.changed().disconnect(self.connection);
        self.mux.dispose();
        self.items_changed.close();
        info!("Context manager disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().disposed
    }

    fn ensure_live(&self) -> Result<(), ContextError> {
        if self.is_disposed() {
            Err(ContextError::UseAfterDispose("ContextManager"))
        } else {
            Ok(())
        }
    }
}
