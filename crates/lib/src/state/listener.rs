//! Lifecycle listeners and the weak identity listener collection.
//!
//! Listeners observe states without owning them: the collection stores weak
//! handles keyed on object identity, so equal-but-distinct listeners are
//! each registered once and a listener that is dropped elsewhere simply
//! disappears from the set. Notification is always performed on a snapshot
//! taken under the collection lock, with the lock released before any
//! callback runs; a callback may therefore re-enter `add`/`remove` freely.

use std::sync::{Arc, Mutex, Weak};

use crate::id::NodeId;
use crate::name::QName;
use crate::state::{ItemState, Status};

/// Observer of item-state status transitions.
pub trait ItemStateListener: Send + Sync {
    /// Called on every status transition of an observed state, including
    /// the MODIFIED pulse. `state` carries the new status; `previous` is
    /// the status before the transition.
    fn status_changed(&self, state: &Arc<ItemState>, previous: Status);

    /// Identity hook used by the workspace layer to find the session state
    /// among its listeners. Only [`ItemState`] returns `Some`.
    fn as_item_state(&self) -> Option<Arc<ItemState>> {
        None
    }
}

/// Observer of structural changes to a node state's child collection.
pub trait NodeStateListener: Send + Sync {
    /// A child entry was added to `parent`.
    fn node_added(&self, parent: &Arc<ItemState>, name: &QName, index: u32, id: &NodeId);

    /// A child entry was removed from `parent`. `index` is the position the
    /// entry held before removal.
    fn node_removed(&self, parent: &Arc<ItemState>, name: &QName, index: u32, id: &NodeId);

    /// The child collection of `parent` was replaced or reordered
    /// wholesale.
    fn nodes_replaced(&self, parent: &Arc<ItemState>);
}

/// A collection of weak, identity-keyed listener handles.
///
/// Dead handles are pruned opportunistically on every mutation and
/// snapshot; they are never observed by callers.
pub(crate) struct ListenerSet<L: ?Sized> {
    inner: Mutex<Vec<Weak<L>>>,
}

impl<L: ?Sized> std::fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = self.inner.lock().unwrap().len();
        f.debug_struct("ListenerSet")
            .field("registered", &registered)
            .finish()
    }
}

impl<L: ?Sized> ListenerSet<L> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Registers a listener. Registering the same object twice is a no-op;
    /// identity is pointer identity, never value equality.
    pub(crate) fn add(&self, listener: &Arc<L>) {
        let handle = Arc::downgrade(listener);
        let mut listeners = self.inner.lock().unwrap();
        listeners.retain(|existing| existing.strong_count() > 0);
        if listeners.iter().any(|existing| Weak::ptr_eq(existing, &handle)) {
            tracing::debug!("listener already registered");
            return;
        }
        listeners.push(handle);
    }

    /// Deregisters a listener by identity. Unknown listeners are ignored.
    pub(crate) fn remove(&self, listener: &Arc<L>) {
        let handle = Arc::downgrade(listener);
        let mut listeners = self.inner.lock().unwrap();
        listeners.retain(|existing| {
            existing.strong_count() > 0 && !Weak::ptr_eq(existing, &handle)
        });
    }

    /// Returns strong handles to every live listener. The snapshot is taken
    /// under the collection lock; callers iterate it lock-free.
    pub(crate) fn snapshot(&self) -> Vec<Arc<L>> {
        let mut listeners = self.inner.lock().unwrap();
        let mut alive = Vec::with_capacity(listeners.len());
        listeners.retain(|existing| match existing.upgrade() {
            Some(strong) => {
                alive.push(strong);
                true
            }
            None => false,
        });
        alive
    }
}
