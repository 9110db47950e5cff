//! Typed callback registry used for every event stream in the crate.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle returned by [`Signal::connect`], used to disconnect later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct SignalInner<T> {
    slots: Vec<(ConnectionId, Slot<T>)>,
    next_id: u64,
    closed: bool,
}

/// A cloneable, thread-safe observer list.
///
/// Clones share the same listeners. Listeners run on the emitting thread, in
/// connection order, with no internal lock held, so they may connect,
/// disconnect or emit re-entrantly. A listener disconnected during an emission
/// is not called for the remainder of it.
pub struct Signal<T> {
    inner: Arc<Mutex<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Signal")
            .field("listeners", &inner.slots.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SignalInner {
                slots: Vec::new(),
                next_id: 1,
                closed: false,
            })),
        }
    }

    /// Register a listener.
    ///
    /// On a closed signal the listener is dropped immediately and the returned
    /// id is inert.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        let id = ConnectionId(inner.next_id);
        inner.next_id += 1;
        if !inner.closed {
            inner.slots.push((id, Arc::new(slot)));
        }
        id
    }

    /// Remove a listener. Returns whether it was connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.slots.len();
        inner.slots.retain(|(slot_id, _)| *slot_id != id);
        inner.slots.len() != before
    }

    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.inner.lock().slots.iter().any(|(slot_id, _)| *slot_id == id)
    }

    /// Deliver `args` to every listener. Returns how many were called.
    pub fn emit(&self, args: &T) -> usize {
        let snapshot: Vec<(ConnectionId, Slot<T>)> = {
            let inner = self.inner.lock();
            if inner.closed {
                return 0;
            }
            inner.slots.clone()
        };

        let mut delivered = 0;
        for (id, slot) in snapshot {
            if !self.is_connected(id) {
                continue;
            }
            slot(args);
            delivered += 1;
        }
        delivered
    }

    /// Drop every listener; the signal stays usable.
    pub fn clear(&self) {
        self.inner.lock().slots.clear();
    }

    /// Drop every listener and refuse new ones. Permanent.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.slots.clear();
        inner.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().slots.len()
    }
}
