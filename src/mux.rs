//! Context multiplexer: fans many context streams into one tagged stream.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::{
    same_instance, ConnectionId, Context, ContextState, SharedContext, Signal, StateChange,
};
use crate::error::ContextError;

/// A context transition tagged with the originating context's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextChange {
    pub context: String,
    pub new_state: ContextState,
}

struct Registration {
    context: SharedContext,
    connection: ConnectionId,
}

#[derive(Default)]
struct Registry {
    order: Vec<Registration>,
    index: HashMap<String, usize>,
}

#[derive(Default)]
struct DispatchQueue {
    pending: VecDeque<ContextChange>,
    draining: bool,
    closed: bool,
}

/// State shared with the listeners installed on each context.
struct Dispatcher {
    changed: Signal<ContextChange>,
    queue: Mutex<DispatchQueue>,
}

impl Dispatcher {
    /// Queue `change` and drain unless another call is already draining.
    ///
    /// Re-entrant emissions (a listener flipping a context) and emissions from
    /// other threads are delivered by the active drainer once the current
    /// change has been fully handled, so changes never interleave.
    fn deliver(&self, change: ContextChange) {
        {
            let mut queue = self.queue.lock();
            if queue.closed {
                return;
            }
            queue.pending.push_back(change);
            if queue.draining {
                return;
            }
            queue.draining = true;
        }

        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        queue.draining = false;
                        return;
                    }
                }
            };
            debug!(context = %next.context, state = %next.new_state, "Dispatching context change");
            self.changed.emit(&next);
        }
    }

    fn close(&self) {
        {
            let mut queue = self.queue.lock();
            queue.closed = true;
            queue.pending.clear();
        }
        self.changed.close();
    }
}

/// Registry of named contexts with a single merged change stream.
///
/// The multiplexer owns every registered context for disposal: disposing it
/// disposes them all, whoever constructed them.
pub struct ContextMultiplexer {
    registry: Mutex<Registry>,
    dispatcher: Arc<Dispatcher>,
    disposed: AtomicBool,
}

impl Default for ContextMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextMultiplexer {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::default()),
            dispatcher: Arc::new(Dispatcher {
                changed: Signal::new(),
                queue: Mutex::new(DispatchQueue::default()),
            }),
            disposed: AtomicBool::new(false),
        }
    }

    /// The merged stream of tagged transitions.
    pub fn changed(&self) -> &Signal<ContextChange> {
        &self.dispatcher.changed
    }

    /// Register `context` under its name. Returns `true` if it replaced a prior
    /// registration.
    ///
    /// A replaced context is detached and, unless it is the same instance being
    /// re-added, disposed.
    pub fn add(&self, context: SharedContext) -> Result<bool, ContextError> {
        self.ensure_live()?;
        let name = context.name().to_string();

        let connection = {
            let dispatcher = self.dispatcher.clone();
            let name = name.clone();
            context
                .state_changed()
                .connect(move |change: &StateChange| {
                    dispatcher.deliver(ContextChange {
                        context: name.clone(),
                        new_state: change.new_state,
                    })
                })
        };

        let registration = Registration {
            context: context.clone(),
            connection,
        };
        let replaced = {
            let mut registry = self.registry.lock();
            match registry.index.get(&name).copied() {
                Some(position) => Some(std::mem::replace(&mut registry.order[position], registration)),
                None => {
                    let position = registry.order.len();
                    registry.order.push(registration);
                    registry.index.insert(name.clone(), position);
                    None
                }
            }
        };

        match replaced {
            Some(old) => {
                old.context.state_changed().disconnect(old.connection);
                if !same_instance(&old.context, &context) {
                    old.context.dispose();
                }
                info!(context = %name, "Context re-registered");
                Ok(true)
            }
            None => {
                info!(context = %name, state = %context.state(), "Context registered");
                Ok(false)
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.lock().index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<SharedContext, ContextError> {
        self.ensure_live()?;
        let registry = self.registry.lock();
        registry
            .index
            .get(name)
            .map(|&position| registry.order[position].context.clone())
            .ok_or_else(|| ContextError::NotFound(name.to_string()))
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.registry
            .lock()
            .order
            .iter()
            .map(|r| r.context.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registry.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ask every context to re-derive its state, in registration order.
    pub fn refresh(&self) -> Result<(), ContextError> {
        self.ensure_live()?;
        for context in self.snapshot() {
            context.refresh();
        }
        Ok(())
    }

    /// Detach from and dispose every context, then close the merged stream.
    /// Idempotent.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let registrations = {
            let mut registry = self.registry.lock();
            registry.index.clear();
            std::mem::take(&mut registry.order)
        };
        for registration in &registrations {
            registration
                .context
                .state_changed()
                .disconnect(registration.connection);
            registration.context.dispose();
        }
        self.dispatcher.close();
        info!(contexts = registrations.len(), "Context multiplexer disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Deliver a change that did not come from a context emission through the
    /// same queue, so it is ordered against changes already being dispatched.
    pub(crate) fn inject(&self, change: ContextChange) {
        self.dispatcher.deliver(change);
    }

    fn snapshot(&self) -> Vec<SharedContext> {
        self.registry
            .lock()
            .order
            .iter()
            .map(|r| r.context.clone())
            .collect()
    }

    fn ensure_live(&self) -> Result<(), ContextError> {
        if self.is_disposed() {
            Err(ContextError::UseAfterDispose("ContextMultiplexer"))
        } else {
            Ok(())
        }
    }
}
