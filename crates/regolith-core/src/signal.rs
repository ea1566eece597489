//! Signal/slot system for Regolith.
//!
//! A [`Signal<Args>`] holds a table of connected slots (closures). Emitting the
//! signal invokes every connected slot, in connection order, on the emitting
//! thread.
//!
//! # Re-entrancy
//!
//! The engine is driven from a single event-dispatch thread, and a slot will
//! routinely call back into the object that emitted the signal (a selection
//! model notifying a mirror that then writes to a collection that notifies the
//! mirror again). Slots are therefore invoked *after* the connection table lock
//! has been released: a slot may emit, connect or disconnect on the same signal
//! without deadlocking. A slot connected during an emit first fires on the
//! next emit.
//!
//! # Key Types
//!
//! - [`Signal<Args>`]: the notification source
//! - [`ConnectionId`]: handle for a connected slot
//! - [`ConnectionGuard`]: disconnects its slot on drop
//!
//! # Example
//!
//! ```
//! use regolith_core::Signal;
//!
//! let rows_inserted = Signal::<(usize, usize)>::new();
//!
//! let conn_id = rows_inserted.connect(|(first, last)| {
//!     println!("rows {first}..={last} inserted");
//! });
//!
//! rows_inserted.emit((0, 3));
//! rows_inserted.disconnect(conn_id);
//! ```

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle for one connected slot, accepted by [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;
type SlotTable<Args> = Mutex<SlotMap<ConnectionId, Slot<Args>>>;

/// A notification source with any number of connected slots.
///
/// Slots receive the emitted value by reference. Notifications without a
/// payload use `Signal<()>`; several values travel as a tuple or a struct.
pub struct Signal<Args> {
    /// All active connections, shared with any [`ConnectionGuard`]s.
    connections: Arc<SlotTable<Args>>,
    /// When set, `emit` drops notifications.
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Creates a signal with nothing connected.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(SlotMap::with_key())),
            blocked: AtomicBool::new(false),
        }
    }

    /// Adds a slot and returns its handle.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Adds a slot that stays connected for as long as the returned guard lives.
    ///
    /// The guard refers to the connection table weakly and may outlive the
    /// signal.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            connections: Arc::downgrade(&self.connections),
            id,
        }
    }

    /// Removes a slot. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Removes every slot.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Returns how many slots are connected.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Suppresses or re-enables delivery.
    ///
    /// Notifications emitted while blocked are lost, not queued.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, AtomicOrdering::SeqCst);
    }

    /// Returns `true` while delivery is suppressed.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(AtomicOrdering::SeqCst)
    }

    /// Delivers `args` to every slot, oldest connection first.
    #[tracing::instrument(skip_all, target = "regolith_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "blocked, notification dropped");
            return;
        }

        // Slots run with the table unlocked.
        let slots: Vec<Slot<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "delivering");
        slots.iter().for_each(|slot| slot(&args));
    }
}

/// Keeps a slot connected until dropped. Returned by [`Signal::connect_scoped`].
///
/// ```
/// use regolith_core::Signal;
///
/// let layout_changed = Signal::<()>::new();
/// let guard = layout_changed.connect_scoped(|_| println!("relayout"));
/// assert_eq!(layout_changed.connection_count(), 1);
///
/// drop(guard);
/// assert_eq!(layout_changed.connection_count(), 0);
/// ```
pub struct ConnectionGuard<Args> {
    connections: Weak<SlotTable<Args>>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    /// Handle of the guarded slot.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(connections) = self.connections.upgrade() {
            connections.lock().remove(self.id);
        }
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(ConnectionGuard<()>: Send, Sync);
