//! External change events.
//!
//! The item-state manager translates the observation stream of the remote
//! store into [`Event`] values and feeds each one to the workspace state it
//! concerns: child add/remove/reorder and property-name changes go to the
//! parent node state, value changes and removals of a property go to the
//! property state itself. Applying an event mutates the state's own data
//! and then drives its status machine (see `ItemState::refresh_external`).

use serde::{Deserialize, Serialize};

use crate::id::{ItemId, NodeId, PropertyId};
use crate::name::QName;

/// The kind of an external change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    NodeAdded,
    NodeRemoved,
    PropertyAdded,
    PropertyChanged,
    PropertyRemoved,
    ChildReordered,
}

/// One external change, as reported by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    kind: EventKind,
    item_id: ItemId,
    name: QName,
    /// For reorders: the sibling the subject now precedes, or `None` when
    /// it moved to the end.
    before: Option<NodeId>,
}

impl Event {
    /// A child node appeared under the receiving node state.
    pub fn node_added(child: NodeId, name: QName) -> Self {
        Self {
            kind: EventKind::NodeAdded,
            item_id: ItemId::Node(child),
            name,
            before: None,
        }
    }

    /// A child node disappeared. Delivered to the parent node state; when
    /// the subject is the receiving state itself, the state is removed.
    pub fn node_removed(child: NodeId, name: QName) -> Self {
        Self {
            kind: EventKind::NodeRemoved,
            item_id: ItemId::Node(child),
            name,
            before: None,
        }
    }

    /// A child node changed its position among its siblings.
    pub fn child_reordered(child: NodeId, name: QName, before: Option<NodeId>) -> Self {
        Self {
            kind: EventKind::ChildReordered,
            item_id: ItemId::Node(child),
            name,
            before,
        }
    }

    /// A property appeared under the receiving node state.
    pub fn property_added(id: PropertyId) -> Self {
        let name = id.name().clone();
        Self {
            kind: EventKind::PropertyAdded,
            item_id: ItemId::Property(id),
            name,
            before: None,
        }
    }

    /// A property's value changed. Delivered to the property state.
    pub fn property_changed(id: PropertyId) -> Self {
        let name = id.name().clone();
        Self {
            kind: EventKind::PropertyChanged,
            item_id: ItemId::Property(id),
            name,
            before: None,
        }
    }

    /// A property disappeared. Delivered both to the parent node state
    /// (which drops the name) and to the property state (which is removed).
    pub fn property_removed(id: PropertyId) -> Self {
        let name = id.name().clone();
        Self {
            kind: EventKind::PropertyRemoved,
            item_id: ItemId::Property(id),
            name,
            before: None,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The id of the item the change is about.
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    /// For reorders, the sibling the subject now precedes.
    pub fn before(&self) -> Option<&NodeId> {
        self.before.as_ref()
    }
}
