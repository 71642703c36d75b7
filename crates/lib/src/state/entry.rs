//! Child node entries: ordered-collection membership plus lazy resolution.
//!
//! An entry is the link from a parent node state to one child. It doubles
//! as a weakly cached reference: the target state is looked up on demand
//! through the factory/manager boundary and only a weak handle is retained,
//! so holding a parent for a long time never pins its subtree in memory.
//!
//! Two resolution flavors exist. A UUID entry addresses a child with stable
//! identity and resolves through the item-state manager. A path-element
//! entry addresses a child that has no identity of its own and asks the
//! factory to materialize it below the (still live) parent.

use std::sync::{Arc, Mutex, Weak};

use crate::id::{ItemId, NodeId};
use crate::name::QName;
use crate::state::manager::{ItemStateFactory, ItemStateManager};
use crate::state::{ItemState, StateError};

/// How a child entry reaches its target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceFlavor {
    /// Resolve by global id through the manager.
    Uuid,
    /// Resolve by path step through the factory, relative to the parent.
    PathElement,
}

/// The link from a parent node state to one child node.
///
/// Entries are value-like after construction: name and id never change.
/// The same-name-sibling index is deliberately not stored; it is a property
/// of the parent's current collection and is re-queried on every use.
#[derive(Debug)]
pub struct ChildNodeEntry {
    parent: Weak<ItemState>,
    name: QName,
    id: NodeId,
    flavor: ReferenceFlavor,
    target: Mutex<Weak<ItemState>>,
}

impl ChildNodeEntry {
    pub(crate) fn new(parent: Weak<ItemState>, name: QName, id: NodeId) -> Arc<Self> {
        let flavor = if id.is_path_based() {
            ReferenceFlavor::PathElement
        } else {
            ReferenceFlavor::Uuid
        };
        Arc::new(Self {
            parent,
            name,
            id,
            flavor,
            target: Mutex::new(Weak::new()),
        })
    }

    /// Returns the name of the child.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Returns the id of the child.
    pub fn node_id(&self) -> &NodeId {
        &self.id
    }

    /// Returns the parent state that owns this entry, if it is still alive.
    pub fn parent(&self) -> Option<Arc<ItemState>> {
        self.parent.upgrade()
    }

    /// Returns the 1-based same-name-sibling index of this entry within its
    /// parent's current collection, or `None` when the parent is gone or no
    /// longer lists this child.
    pub fn index(&self) -> Option<u32> {
        let parent = self.parent.upgrade()?;
        parent.child_node_index(&self.name, &self.id)
    }

    /// Returns the target state of this entry.
    ///
    /// A live weak-cached target is returned directly. Otherwise the entry
    /// resolves through the manager (UUID flavor) or the factory
    /// (path-element flavor) and refreshes the cache. Fails with
    /// [`StateError::NoSuchItem`] when the id is unknown and with
    /// [`StateError::ItemStateError`] when the underlying store raises.
    pub fn resolve(
        &self,
        factory: &dyn ItemStateFactory,
        manager: &dyn ItemStateManager,
    ) -> crate::Result<Arc<ItemState>> {
        if let Some(state) = self.cached() {
            return Ok(state);
        }

        let state = match self.flavor {
            ReferenceFlavor::Uuid => manager.item_state(&ItemId::Node(self.id.clone()))?,
            ReferenceFlavor::PathElement => {
                let parent = self.parent.upgrade().ok_or_else(|| StateError::ItemNotFound {
                    reason: format!("parent of {} reclaimed before resolution", self.id),
                })?;
                factory.create_node_state(&self.id, &parent)?
            }
        };
        tracing::trace!(id = %self.id, "resolved child node entry");
        *self.target.lock().unwrap() = Arc::downgrade(&state);
        Ok(state)
    }

    /// Returns the cached target state if it is still alive. Recursive
    /// session-layer walks use this so that only subtrees that were
    /// actually materialized are visited.
    pub fn cached(&self) -> Option<Arc<ItemState>> {
        self.target.lock().unwrap().upgrade()
    }

    /// Primes the weak target cache. Used when the child state is created
    /// eagerly (new transient children) rather than through `resolve`.
    pub fn attach(&self, state: &Arc<ItemState>) {
        *self.target.lock().unwrap() = Arc::downgrade(state);
    }

    /// Entry equivalence for diff purposes: same name and same id, index
    /// disregarded.
    pub(crate) fn same_child(&self, other: &ChildNodeEntry) -> bool {
        self.id == other.id && self.name == other.name
    }
}
