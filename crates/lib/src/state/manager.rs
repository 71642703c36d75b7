//! The factory/manager boundary.
//!
//! The core never talks to the remote store directly. Workspace states are
//! minted by an [`ItemStateFactory`] and cached by an [`ItemStateManager`];
//! child references resolve through the two of them and the core holds a
//! state's monitor across neither call, since both may block on I/O.

use std::sync::Arc;

use crate::id::{ItemId, NodeId, PropertyId};
use crate::state::ItemState;

/// Access to the identity map of known item states.
///
/// The manager owns the canonical state for every resolved id. Asking for
/// an id it does not know fails with the no-such-item error kind; failures
/// of the underlying store are wrapped with their source attached.
pub trait ItemStateManager: Send + Sync {
    /// Returns the state for `id`.
    fn item_state(&self, id: &ItemId) -> crate::Result<Arc<ItemState>>;

    /// Returns true if the manager knows a state for `id` without forcing
    /// its resolution.
    fn has_item_state(&self, id: &ItemId) -> bool;
}

/// Creates workspace states from ids on first resolution.
pub trait ItemStateFactory: Send + Sync {
    /// Creates the workspace node state for `id` below `parent`.
    fn create_node_state(
        &self,
        id: &NodeId,
        parent: &Arc<ItemState>,
    ) -> crate::Result<Arc<ItemState>>;

    /// Creates the workspace property state for `id` below `parent`.
    fn create_property_state(
        &self,
        id: &PropertyId,
        parent: &Arc<ItemState>,
    ) -> crate::Result<Arc<ItemState>>;
}
