//! Node-state data and operations.
//!
//! A node state extends the shared item-state machinery with its primary
//! and mixin types, an optional definition slot, the ordered child
//! collection, and the set of property names. The child collection and the
//! property-name set are held through `Arc` handles: pulling a session
//! state from its workspace twin (and every `reset`) clones the handles, so
//! the pair shares the structures until one side mutates. Mutations go
//! through `Arc::make_mut`, which clones a shared structure implicitly and
//! leaves the other holder untouched.
//!
//! All operations here panic when invoked on a property state; node-ness is
//! a tag test (`is_node`), not a type distinction.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::event::{Event, EventKind};
use crate::id::{IdFactory, ItemId, NodeId, PropertyId};
use crate::name::QName;
use crate::nodetype::NodeDefinition;
use crate::path::DEFAULT_INDEX;
use crate::state::children::ChildNodeEntries;
use crate::state::entry::ChildNodeEntry;
use crate::state::errors::StateError;
use crate::state::item::{ItemKind, ItemState, Layer, NodeSlot};
use crate::state::listener::{ListenerSet, NodeStateListener};
use crate::state::status::Status;

/// The mutable payload of a node state, guarded by the per-state monitor.
#[derive(Debug, Clone)]
pub(super) struct NodeData {
    pub(super) id: NodeId,
    pub(super) name: QName,
    pub(super) primary_type: QName,
    pub(super) mixin_types: Vec<QName>,
    pub(super) definition: Option<Arc<NodeDefinition>>,
    pub(super) child_entries: Arc<ChildNodeEntries>,
    pub(super) property_names: Arc<HashSet<QName>>,
}

impl ItemState {
    /// Creates an unconnected node state. The initial status must be NEW or
    /// EXISTING.
    pub fn new_node(
        layer: Layer,
        initial: Status,
        parent: Option<&Arc<ItemState>>,
        id: NodeId,
        name: QName,
        primary_type: QName,
    ) -> crate::Result<Arc<ItemState>> {
        ItemState::build(layer, initial, parent, move || {
            ItemKind::Node(NodeSlot {
                data: Mutex::new(NodeData {
                    id,
                    name,
                    primary_type,
                    mixin_types: Vec::new(),
                    definition: None,
                    child_entries: Arc::new(ChildNodeEntries::new()),
                    property_names: Arc::new(HashSet::new()),
                }),
                listeners: ListenerSet::new(),
            })
        })
    }

    /// Creates a session node state connected to (and pulled from) its
    /// workspace twin. The initial status must be EXISTING,
    /// EXISTING_MODIFIED or EXISTING_REMOVED.
    ///
    /// # Panics
    ///
    /// Panics when `overlayed` is a property state.
    pub fn overlay_node(
        overlayed: &Arc<ItemState>,
        initial: Status,
        parent: Option<&Arc<ItemState>>,
    ) -> crate::Result<Arc<ItemState>> {
        let seed = overlayed.node_slot().data.lock().unwrap().clone();
        ItemState::build_overlaying(overlayed, initial, parent, move || {
            ItemKind::Node(NodeSlot {
                data: Mutex::new(seed),
                listeners: ListenerSet::new(),
            })
        })
    }

    /// Returns true if this state represents a node.
    pub fn is_node(&self) -> bool {
        matches!(self.kind, ItemKind::Node(_))
    }

    pub(super) fn node_slot(&self) -> &NodeSlot {
        match &self.kind {
            ItemKind::Node(slot) => slot,
            ItemKind::Property(_) => panic!("not a node state"),
        }
    }

    /// Returns the id of this node.
    ///
    /// # Panics
    ///
    /// Panics on a property state, as do all node-only operations below.
    pub fn node_id(&self) -> NodeId {
        self.node_slot().data.lock().unwrap().id.clone()
    }

    /// Returns the name of this node's primary type.
    pub fn primary_type(&self) -> QName {
        self.node_slot().data.lock().unwrap().primary_type.clone()
    }

    /// Returns the names of this node's mixin types.
    pub fn mixin_types(&self) -> Vec<QName> {
        self.node_slot().data.lock().unwrap().mixin_types.clone()
    }

    /// Replaces the mixin type names.
    pub fn set_mixin_types(&self, mixin_types: Vec<QName>) {
        self.node_slot().data.lock().unwrap().mixin_types = mixin_types;
    }

    /// Returns every type name that applies to this node, the primary type
    /// last.
    pub fn node_type_names(&self) -> Vec<QName> {
        let data = self.node_slot().data.lock().unwrap();
        let mut types = data.mixin_types.clone();
        types.push(data.primary_type.clone());
        types
    }

    /// Returns the definition applicable to this node, if the resolver has
    /// attached one.
    pub fn definition(&self) -> Option<Arc<NodeDefinition>> {
        self.node_slot().data.lock().unwrap().definition.clone()
    }

    /// Attaches the definition applicable to this node.
    pub fn set_definition(&self, definition: Arc<NodeDefinition>) {
        self.node_slot().data.lock().unwrap().definition = Some(definition);
    }

    //----------------------------------------------------< child entries >---

    /// Returns true if this node has any child node entries.
    pub fn has_child_node_entries(&self) -> bool {
        !self.node_slot().data.lock().unwrap().child_entries.is_empty()
    }

    /// Returns true if this node has a child node entry with `name`.
    pub fn has_child_node_entry(&self, name: &QName) -> bool {
        !self
            .node_slot()
            .data
            .lock()
            .unwrap()
            .child_entries
            .get_name(name)
            .is_empty()
    }

    /// Returns the child node entry at the 1-based same-name-sibling
    /// position, or `None` if there is no matching entry.
    pub fn child_node_entry(&self, name: &QName, index: u32) -> Option<Arc<ChildNodeEntry>> {
        self.node_slot()
            .data
            .lock()
            .unwrap()
            .child_entries
            .get_indexed(name, index)
    }

    /// Returns the child node entry with the given id.
    pub fn child_node_entry_by_id(&self, id: &NodeId) -> Option<Arc<ChildNodeEntry>> {
        self.node_slot().data.lock().unwrap().child_entries.get(id)
    }

    /// Returns all child node entries in insertion order.
    pub fn child_node_entries(&self) -> Vec<Arc<ChildNodeEntry>> {
        self.node_slot()
            .data
            .lock()
            .unwrap()
            .child_entries
            .iter()
            .cloned()
            .collect()
    }

    /// Returns the same-name-sibling list for `name` in insertion order.
    pub fn child_node_entries_named(&self, name: &QName) -> Vec<Arc<ChildNodeEntry>> {
        self.node_slot()
            .data
            .lock()
            .unwrap()
            .child_entries
            .get_name(name)
    }

    /// Returns the 1-based same-name-sibling index of the child with `id`
    /// under `name`, or `None` when this node no longer lists that child.
    /// Indexes are always re-derived from the current collection, never
    /// cached on entries.
    pub fn child_node_index(&self, name: &QName, id: &NodeId) -> Option<u32> {
        self.node_slot()
            .data
            .lock()
            .unwrap()
            .child_entries
            .index_of(name, id)
    }

    /// Appends a child node entry. The entry joins the tail of the
    /// insertion order and of its same-name-sibling list.
    pub fn add_child_node_entry(
        self: &Arc<Self>,
        name: QName,
        id: NodeId,
    ) -> Arc<ChildNodeEntry> {
        let entry = ChildNodeEntry::new(Arc::downgrade(self), name.clone(), id.clone());
        let added = entry.clone();
        let index = self.with_child_entries_mut(move |entries| {
            entries.add(added);
            entries.index_of(&name, &id).unwrap_or(DEFAULT_INDEX)
        });
        self.notify_node_added(&entry, index);
        entry
    }

    /// Renames the child node entry at the 1-based position under
    /// `old_name`: the entry leaves its position and rejoins under
    /// `new_name` at the tail. Fires the removed notification, then the
    /// added one. Returns false if there was no matching entry.
    pub fn rename_child_node_entry(
        self: &Arc<Self>,
        old_name: &QName,
        index: u32,
        new_name: QName,
    ) -> bool {
        let me = Arc::downgrade(self);
        let renamed_name = new_name.clone();
        let outcome = self.with_child_entries_mut(move |entries| {
            let old = entries.remove_indexed(old_name, index)?;
            let renamed =
                ChildNodeEntry::new(me, renamed_name.clone(), old.node_id().clone());
            entries.add(renamed.clone());
            let new_index = entries
                .index_of(&renamed_name, renamed.node_id())
                .unwrap_or(DEFAULT_INDEX);
            Some((old, renamed, new_index))
        });
        match outcome {
            Some((old, renamed, new_index)) => {
                self.notify_node_removed(&old, index);
                self.notify_node_added(&renamed, new_index);
                true
            }
            None => false,
        }
    }

    /// Removes the child node entry at the 1-based same-name-sibling
    /// position. Returns false if there was no matching entry.
    pub fn remove_child_node_entry(self: &Arc<Self>, name: &QName, index: u32) -> bool {
        let removed =
            self.with_child_entries_mut(move |entries| entries.remove_indexed(name, index));
        match removed {
            Some(entry) => {
                self.notify_node_removed(&entry, index);
                true
            }
            None => false,
        }
    }

    /// Removes the child node entry with the given id. Returns false if
    /// there was no matching entry.
    pub fn remove_child_node_entry_by_id(self: &Arc<Self>, id: &NodeId) -> bool {
        let removed = self.with_child_entries_mut(move |entries| {
            let entry = entries.get(id)?;
            let index = entries.index_of(entry.name(), id)?;
            entries.remove(id).map(|entry| (entry, index))
        });
        match removed {
            Some((entry, index)) => {
                self.notify_node_removed(&entry, index);
                true
            }
            None => false,
        }
    }

    /// Removes every child node entry.
    pub fn remove_all_child_node_entries(&self) {
        self.with_child_entries_mut(|entries| entries.clear());
    }

    /// Replaces the child node entries wholesale and fires the replaced
    /// notification.
    pub fn set_child_node_entries(self: &Arc<Self>, children: Vec<(QName, NodeId)>) {
        {
            let mut data = self.node_slot().data.lock().unwrap();
            let mut fresh = ChildNodeEntries::new();
            for (name, id) in children {
                fresh.add(ChildNodeEntry::new(Arc::downgrade(self), name, id));
            }
            data.child_entries = Arc::new(fresh);
        }
        self.notify_nodes_replaced();
    }

    /// Moves the child with `id` so that it precedes the child with
    /// `before`, or to the tail when `before` is `None`. Fires the replaced
    /// notification. Returns false when either id is absent.
    pub fn reorder_child_node_entry(
        self: &Arc<Self>,
        id: &NodeId,
        before: Option<&NodeId>,
    ) -> bool {
        let moved = self.with_child_entries_mut(move |entries| entries.reorder(id, before));
        if moved {
            self.notify_nodes_replaced();
        }
        moved
    }

    //---------------------------------------------------< property names >---

    /// Returns the names of this node's properties.
    pub fn property_names(&self) -> HashSet<QName> {
        (*self.node_slot().data.lock().unwrap().property_names).clone()
    }

    /// Returns true if this node has a property entry with `name`.
    pub fn has_property_name(&self, name: &QName) -> bool {
        self.node_slot()
            .data
            .lock()
            .unwrap()
            .property_names
            .contains(name)
    }

    /// Returns the id of the property with `name`, or `None` if this node
    /// has no such property entry.
    pub fn property_id_for(&self, factory: &dyn IdFactory, name: &QName) -> Option<PropertyId> {
        let data = self.node_slot().data.lock().unwrap();
        if data.property_names.contains(name) {
            Some(factory.property_id(&data.id, name))
        } else {
            None
        }
    }

    /// Adds a property name entry.
    pub fn add_property_name(&self, name: QName) {
        let mut data = self.node_slot().data.lock().unwrap();
        Arc::make_mut(&mut data.property_names).insert(name);
    }

    /// Removes a property name entry. Returns false if the name was
    /// absent.
    pub fn remove_property_name(&self, name: &QName) -> bool {
        let mut data = self.node_slot().data.lock().unwrap();
        Arc::make_mut(&mut data.property_names).remove(name)
    }

    /// Removes every property name entry.
    pub fn remove_all_property_names(&self) {
        let mut data = self.node_slot().data.lock().unwrap();
        data.property_names = Arc::new(HashSet::new());
    }

    /// Replaces the property name entries wholesale.
    pub fn set_property_names(&self, names: HashSet<QName>) {
        let mut data = self.node_slot().data.lock().unwrap();
        data.property_names = Arc::new(names);
    }

    //------------------------------------------------------------< diffs >---

    /// Property names present here but not in the overlayed twin. Without
    /// a twin every own name counts as added.
    pub fn added_property_names(&self) -> HashSet<QName> {
        let own = self.property_names_handle();
        match self.overlayed_data_snapshot() {
            None => (*own).clone(),
            Some(other) => own.difference(&other.property_names).cloned().collect(),
        }
    }

    /// Property names present in the overlayed twin but no longer here.
    pub fn removed_property_names(&self) -> HashSet<QName> {
        let own = self.property_names_handle();
        match self.overlayed_data_snapshot() {
            None => HashSet::new(),
            Some(other) => other.property_names.difference(&own).cloned().collect(),
        }
    }

    /// Child entries present here but not in the overlayed twin, by
    /// (name, id) equivalence. Without a twin every own entry counts as
    /// added.
    pub fn added_child_node_entries(&self) -> Vec<Arc<ChildNodeEntry>> {
        let own = self.child_entries_handle();
        match self.overlayed_data_snapshot() {
            None => own.iter().cloned().collect(),
            Some(other) => own.difference(&other.child_entries),
        }
    }

    /// Child entries present in the overlayed twin but no longer here, by
    /// (name, id) equivalence.
    pub fn removed_child_node_entries(&self) -> Vec<Arc<ChildNodeEntry>> {
        let own = self.child_entries_handle();
        match self.overlayed_data_snapshot() {
            None => Vec::new(),
            Some(other) => other.child_entries.difference(&own),
        }
    }

    /// Child entries that exist in both collections but changed their
    /// relative position.
    ///
    /// The walk compares the two ordered intersections in lockstep. On a
    /// mismatch the current entry is recorded as reordered and every
    /// occurrence of its id is dropped from both lists without advancing,
    /// because the removal shifts the remainder. The result is stable and
    /// non-empty exactly when the orders differ, but it is not guaranteed
    /// minimal.
    pub fn reordered_child_node_entries(&self) -> Vec<Arc<ChildNodeEntry>> {
        let own = self.child_entries_handle();
        let Some(other) = self.overlayed_data_snapshot() else {
            return Vec::new();
        };
        if own.is_empty() || other.child_entries.is_empty() {
            return Vec::new();
        }

        let mut ours = own.intersection(&other.child_entries);
        let mut others = other.child_entries.intersection(&own);

        let mut reordered = Vec::new();
        let mut i = 0;
        while i < ours.len() {
            let entry = ours[i].clone();
            let counterpart = others[i].clone();
            if Arc::ptr_eq(&entry, &counterpart) || entry.node_id() == counterpart.node_id() {
                i += 1;
                continue;
            }
            // When the current entry merely shifted one position, the
            // displaced counterpart is the better thing to report.
            let mut displaced = entry;
            if i + 1 < others.len() && displaced.node_id() == others[i + 1].node_id() {
                if let Some(found) = ours[i..]
                    .iter()
                    .find(|candidate| candidate.node_id() == counterpart.node_id())
                {
                    displaced = found.clone();
                }
            }
            let id = displaced.node_id().clone();
            reordered.push(displaced);
            ours.retain(|candidate| *candidate.node_id() != id);
            others.retain(|candidate| *candidate.node_id() != id);
        }
        reordered
    }

    //--------------------------------------------------------< listeners >---

    /// Registers a structural-change listener on this node. Weak and
    /// identity-keyed like the lifecycle set.
    pub fn add_node_listener(&self, listener: &Arc<dyn NodeStateListener>) {
        self.node_slot().listeners.add(listener);
    }

    /// Deregisters a structural-change listener.
    pub fn remove_node_listener(&self, listener: &Arc<dyn NodeStateListener>) {
        self.node_slot().listeners.remove(listener);
    }

    fn notify_node_added(self: &Arc<Self>, entry: &Arc<ChildNodeEntry>, index: u32) {
        for listener in self.node_slot().listeners.snapshot() {
            listener.node_added(self, entry.name(), index, entry.node_id());
        }
    }

    fn notify_node_removed(self: &Arc<Self>, entry: &Arc<ChildNodeEntry>, index: u32) {
        for listener in self.node_slot().listeners.snapshot() {
            listener.node_removed(self, entry.name(), index, entry.node_id());
        }
    }

    fn notify_nodes_replaced(self: &Arc<Self>) {
        for listener in self.node_slot().listeners.snapshot() {
            listener.nodes_replaced(self);
        }
    }

    //----------------------------------------------------------< internal >---

    /// Runs a mutation against the child collection, cloning it first when
    /// the handle is shared with a paired state.
    fn with_child_entries_mut<R>(&self, mutate: impl FnOnce(&mut ChildNodeEntries) -> R) -> R {
        let mut data = self.node_slot().data.lock().unwrap();
        mutate(Arc::make_mut(&mut data.child_entries))
    }

    fn child_entries_handle(&self) -> Arc<ChildNodeEntries> {
        self.node_slot().data.lock().unwrap().child_entries.clone()
    }

    fn property_names_handle(&self) -> Arc<HashSet<QName>> {
        self.node_slot().data.lock().unwrap().property_names.clone()
    }

    fn overlayed_data_snapshot(&self) -> Option<NodeData> {
        let overlayed = self.overlayed_state()?;
        Some(overlayed.node_slot().data.lock().unwrap().clone())
    }

    pub(super) fn refresh_node_external(self: &Arc<Self>, event: &Event) -> crate::Result<()> {
        match event.kind() {
            EventKind::NodeAdded => {
                let child = expect_node_id(event)?;
                self.add_child_node_entry(event.name().clone(), child.clone());
                self.set_status(Status::Modified)
            }
            EventKind::NodeRemoved => {
                let child = expect_node_id(event)?;
                if *child == self.node_id() {
                    return self.set_status(Status::Removed);
                }
                if !self.remove_child_node_entry_by_id(child) {
                    return Err(StateError::NoSuchItem {
                        id: event.item_id().clone(),
                    }
                    .into());
                }
                self.set_status(Status::Modified)
            }
            EventKind::ChildReordered => {
                let child = expect_node_id(event)?;
                if !self.reorder_child_node_entry(child, event.before()) {
                    return Err(StateError::NoSuchItem {
                        id: event.item_id().clone(),
                    }
                    .into());
                }
                self.set_status(Status::Modified)
            }
            EventKind::PropertyAdded => {
                self.add_property_name(event.name().clone());
                self.set_status(Status::Modified)
            }
            EventKind::PropertyRemoved => {
                if !self.remove_property_name(event.name()) {
                    return Err(StateError::NoSuchItem {
                        id: event.item_id().clone(),
                    }
                    .into());
                }
                self.set_status(Status::Modified)
            }
            kind @ EventKind::PropertyChanged => {
                Err(StateError::UnexpectedEvent { kind }.into())
            }
        }
    }
}

fn expect_node_id(event: &Event) -> Result<&NodeId, StateError> {
    match event.item_id() {
        ItemId::Node(id) => Ok(id),
        ItemId::Property(_) => Err(StateError::UnexpectedEvent { kind: event.kind() }),
    }
}
