//! The item state: shared machinery of the two-layer overlay model.
//!
//! An [`ItemState`] lives on one of two layers. A *workspace* state caches
//! an item as the remote store last reported it and is driven by external
//! events. A *session* state overlays exactly one workspace state (or is
//! NEW) and absorbs the user's transient edits until they are saved or
//! discarded. The two are linked by the lifecycle-listener protocol: on
//! `connect` the session state registers itself with its workspace twin and
//! reacts to the twin's status transitions by resynchronizing, going stale,
//! or detaching.
//!
//! States are always handled as `Arc<ItemState>`; every state keeps a weak
//! handle to itself so that it can register as a listener from `&self`.
//! Node- and property-specific data hang off the state as a tagged variant;
//! node-only operations live in the sibling `node` module and panic when
//! invoked on a property state.

use std::sync::{Arc, Mutex, Weak};

use crate::event::Event;
use crate::id::ItemId;
use crate::name::QName;
use crate::path::{Path, PathBuilder, DEFAULT_INDEX};
use crate::state::errors::StateError;
use crate::state::listener::{ItemStateListener, ListenerSet, NodeStateListener};
use crate::state::node::NodeData;
use crate::state::property::PropertyData;
use crate::state::status::Status;

/// The layer a state lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Caches authoritative external state; accepts external events.
    Workspace,
    /// Holds transient session edits; overlays a workspace state.
    Session,
}

/// Node- or property-specific payload of a state.
#[derive(Debug)]
pub(super) enum ItemKind {
    Node(NodeSlot),
    Property(PropertySlot),
}

#[derive(Debug)]
pub(super) struct NodeSlot {
    pub(super) data: Mutex<NodeData>,
    pub(super) listeners: ListenerSet<dyn NodeStateListener>,
}

#[derive(Debug)]
pub(super) struct PropertySlot {
    pub(super) data: Mutex<PropertyData>,
}

/// The state of one item on one layer.
#[derive(Debug)]
pub struct ItemState {
    pub(super) me: Weak<ItemState>,
    pub(super) layer: Layer,
    pub(super) status: Mutex<Status>,
    /// Parent node state. `None` for the root and for free-floating states.
    pub(super) parent: Mutex<Option<Weak<ItemState>>>,
    /// Workspace twin of a session state. Strong in this direction only;
    /// the reverse link exists solely through the weak listener set.
    pub(super) overlayed: Mutex<Option<Arc<ItemState>>>,
    pub(super) listeners: ListenerSet<dyn ItemStateListener>,
    pub(super) kind: ItemKind,
}

impl ItemState {
    pub(super) fn build(
        layer: Layer,
        initial: Status,
        parent: Option<&Arc<ItemState>>,
        kind_of: impl FnOnce() -> ItemKind,
    ) -> crate::Result<Arc<ItemState>> {
        if !matches!(initial, Status::New | Status::Existing) {
            tracing::debug!(status = %initial, "illegal initial status");
            return Err(StateError::IllegalInitialStatus { status: initial }.into());
        }
        Ok(Arc::new_cyclic(|me| ItemState {
            me: me.clone(),
            layer,
            status: Mutex::new(initial),
            parent: Mutex::new(parent.map(Arc::downgrade)),
            overlayed: Mutex::new(None),
            listeners: ListenerSet::new(),
            kind: kind_of(),
        }))
    }

    pub(super) fn build_overlaying(
        overlayed: &Arc<ItemState>,
        initial: Status,
        parent: Option<&Arc<ItemState>>,
        kind_of: impl FnOnce() -> ItemKind,
    ) -> crate::Result<Arc<ItemState>> {
        if !matches!(
            initial,
            Status::Existing | Status::ExistingModified | Status::ExistingRemoved
        ) {
            tracing::debug!(status = %initial, "illegal initial status for overlaying state");
            return Err(StateError::IllegalInitialStatus { status: initial }.into());
        }
        // callers seed the kind from the overlayed state's data, which is
        // what establishes the copy-on-write sharing of the pair
        let state = Arc::new_cyclic(|me| ItemState {
            me: me.clone(),
            layer: Layer::Session,
            status: Mutex::new(initial),
            parent: Mutex::new(parent.map(Arc::downgrade)),
            overlayed: Mutex::new(None),
            listeners: ListenerSet::new(),
            kind: kind_of(),
        });
        state.connect(overlayed)?;
        Ok(state)
    }

    pub(super) fn me(&self) -> Arc<ItemState> {
        self.me.upgrade().expect("state is alive while borrowed")
    }

    //------------------------------------------------------------< layers >---

    /// Returns the layer of this state.
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Returns true if this state caches authoritative external state.
    pub fn is_workspace_state(&self) -> bool {
        self.layer == Layer::Workspace
    }

    /// Returns true if this state holds transient session edits.
    pub fn is_session_state(&self) -> bool {
        self.layer == Layer::Session
    }

    /// Fails unless this is a workspace state.
    pub fn check_is_workspace_state(&self) -> Result<(), StateError> {
        if self.is_workspace_state() {
            Ok(())
        } else {
            Err(StateError::NotWorkspaceState)
        }
    }

    /// Fails unless this is a session state.
    pub fn check_is_session_state(&self) -> Result<(), StateError> {
        if self.is_session_state() {
            Ok(())
        } else {
            Err(StateError::NotSessionState)
        }
    }

    //------------------------------------------------------------< status >---

    /// Returns the current status.
    pub fn status(&self) -> Status {
        *self.status.lock().unwrap()
    }

    /// Returns true if this state is usable for reads and edits.
    pub fn is_valid(&self) -> bool {
        self.status().is_valid()
    }

    /// Transitions this state to `new_status`.
    ///
    /// Setting the current status again is a no-op. A terminal status
    /// rejects every transition; anything else is validated against the
    /// layer's transition table. Listeners are notified from a snapshot
    /// taken under the collection lock and invoked with no lock held, so a
    /// callback may freely re-enter the listener registration methods. The
    /// MODIFIED pulse collapses back to EXISTING once the listeners have
    /// run, unless one of them installed a different status in the
    /// meantime.
    pub fn set_status(self: &Arc<Self>, new_status: Status) -> crate::Result<()> {
        let previous = {
            let mut status = self.status.lock().unwrap();
            let old = *status;
            if old == new_status {
                return Ok(());
            }
            if old.is_terminal() {
                tracing::debug!(status = %old, "status change on terminal state");
                return Err(StateError::Terminal { status: old }.into());
            }
            if !Status::is_valid_change(old, new_status, self.is_workspace_state()) {
                tracing::debug!(from = %old, to = %new_status, "invalid status change");
                return Err(StateError::InvalidStatusChange {
                    from: old,
                    to: new_status,
                }
                .into());
            }
            *status = new_status;
            old
        };

        for listener in self.listeners.snapshot() {
            listener.status_changed(self, previous);
        }

        if new_status == Status::Modified {
            let mut status = self.status.lock().unwrap();
            if *status == Status::Modified {
                *status = Status::Existing;
            }
        }
        Ok(())
    }

    //---------------------------------------------------------< listeners >---

    /// Registers a lifecycle listener. The collection holds it weakly and
    /// keys on identity; registering the same object twice is a no-op.
    pub fn add_listener(&self, listener: &Arc<dyn ItemStateListener>) {
        self.listeners.add(listener);
    }

    /// Deregisters a lifecycle listener.
    pub fn remove_listener(&self, listener: &Arc<dyn ItemStateListener>) {
        self.listeners.remove(listener);
    }

    //------------------------------------------------------------< layout >---

    /// Returns the name of this item.
    pub fn name(&self) -> QName {
        match &self.kind {
            ItemKind::Node(slot) => slot.data.lock().unwrap().name.clone(),
            ItemKind::Property(slot) => slot.data.lock().unwrap().id.name().clone(),
        }
    }

    /// Returns the identifier of this item.
    pub fn item_id(&self) -> ItemId {
        match &self.kind {
            ItemKind::Node(slot) => ItemId::Node(slot.data.lock().unwrap().id.clone()),
            ItemKind::Property(slot) => {
                ItemId::Property(slot.data.lock().unwrap().id.clone())
            }
        }
    }

    /// Returns the parent node state, or `None` if this state represents
    /// the root, is free floating, or its parent has been reclaimed.
    pub fn parent(&self) -> Option<Arc<ItemState>> {
        self.parent.lock().unwrap().as_ref()?.upgrade()
    }

    /// Re-hangs this state below `parent`, or detaches it.
    pub fn set_parent(&self, parent: Option<&Arc<ItemState>>) {
        *self.parent.lock().unwrap() = parent.map(Arc::downgrade);
    }

    /// Builds the qualified path of this state bottom-up. Node steps carry
    /// their current same-name-sibling index, elided when it is the
    /// default. Fails with the item-not-found kind when a parent has been
    /// reclaimed or no longer lists the walked child.
    pub fn qpath(&self) -> crate::Result<Path> {
        if self.parent.lock().unwrap().is_none() {
            // shortcut for the root state
            return Ok(Path::root());
        }

        let mut builder = PathBuilder::new();
        let mut current = self.me();
        loop {
            let link = current.parent.lock().unwrap().clone();
            let Some(weak) = link else {
                break;
            };
            let parent = weak.upgrade().ok_or_else(|| StateError::ItemNotFound {
                reason: format!(
                    "parent of {} reclaimed during path construction",
                    current.name()
                ),
            })?;
            let name = current.name();
            if current.is_node() {
                let id = current.node_id();
                let index =
                    parent
                        .child_node_index(&name, &id)
                        .ok_or_else(|| StateError::ItemNotFound {
                            reason: format!("{name} is no longer a child of its parent"),
                        })?;
                builder.push_front_indexed(name, index)?;
            } else {
                builder.push_front_indexed(name, DEFAULT_INDEX)?;
            }
            current = parent;
        }
        Ok(builder.build())
    }

    //----------------------------------------------------------< overlays >---

    /// Returns true if this state overlays a workspace state.
    pub fn has_overlayed_state(&self) -> bool {
        self.overlayed.lock().unwrap().is_some()
    }

    /// Returns the workspace twin of this session state.
    pub fn overlayed_state(&self) -> Option<Arc<ItemState>> {
        self.overlayed.lock().unwrap().clone()
    }

    /// Returns the workspace state backing this state: itself on the
    /// workspace layer, the overlayed twin on the session layer (`None`
    /// while NEW).
    pub fn workspace_state(self: &Arc<Self>) -> Option<Arc<ItemState>> {
        if self.is_workspace_state() {
            Some(self.clone())
        } else {
            self.overlayed_state()
        }
    }

    /// Returns the session state overlaying this workspace state, found
    /// through the weak listener back-channel, or `None` if none has been
    /// created (or it has been reclaimed).
    pub fn session_state(&self) -> Option<Arc<ItemState>> {
        if self.is_session_state() {
            return None;
        }
        self.listeners
            .snapshot()
            .into_iter()
            .find_map(|listener| listener.as_item_state())
    }

    /// Connects this session state to its workspace twin and registers it
    /// as a lifecycle listener there. Connecting the same twin again is a
    /// no-op; rebinding to a different one fails.
    pub fn connect(self: &Arc<Self>, overlayed: &Arc<ItemState>) -> crate::Result<()> {
        self.check_is_session_state()?;
        overlayed.check_is_workspace_state()?;

        {
            let mut slot = self.overlayed.lock().unwrap();
            match &*slot {
                Some(existing) if Arc::ptr_eq(existing, overlayed) => return Ok(()),
                Some(_) => {
                    tracing::debug!("attempted rebind of overlayed state");
                    return Err(StateError::AlreadyConnected.into());
                }
                None => *slot = Some(overlayed.clone()),
            }
        }
        let listener: Arc<dyn ItemStateListener> = self.clone();
        overlayed.add_listener(&listener);
        Ok(())
    }

    /// Re-synchronizes this session state's data from its workspace twin.
    /// The copy re-establishes copy-on-write sharing of the child
    /// collection and the property-name set.
    pub fn reset(&self) -> crate::Result<()> {
        self.check_is_session_state()?;
        let overlayed = self
            .overlayed_state()
            .ok_or(StateError::NotConnected)?;
        self.copy_data_from(&overlayed);
        Ok(())
    }

    /// Copies all data from `source` into this state. The source's data is
    /// snapshotted under its own lock and installed under ours, so the two
    /// state monitors are never held together. Collection handles are
    /// cloned, which is what makes the pair share until first mutation.
    ///
    /// # Panics
    ///
    /// Panics when the states are of different kinds; paired states are
    /// always both nodes or both properties.
    pub(super) fn copy_data_from(&self, source: &ItemState) {
        match (&self.kind, &source.kind) {
            (ItemKind::Node(own), ItemKind::Node(theirs)) => {
                let snapshot = theirs.data.lock().unwrap().clone();
                *own.data.lock().unwrap() = snapshot;
            }
            (ItemKind::Property(own), ItemKind::Property(theirs)) => {
                let snapshot = theirs.data.lock().unwrap().clone();
                *own.data.lock().unwrap() = snapshot;
            }
            _ => panic!("kind mismatch between paired item states"),
        }
    }

    /// Applies committed session data onto this workspace state and fires
    /// the MODIFIED pulse that re-synchronizes every connected session
    /// state.
    pub(super) fn commit_data_from(self: &Arc<Self>, session: &ItemState) -> crate::Result<()> {
        self.check_is_workspace_state()?;
        self.copy_data_from(session);
        self.set_status(Status::Modified)
    }

    //--------------------------------------------------< session edits >---

    /// Marks this session state as carrying transient modifications.
    /// Already-modified and NEW states are left alone; stale and removed
    /// states reject the edit.
    pub fn mark_modified(self: &Arc<Self>) -> crate::Result<()> {
        self.check_is_session_state()?;
        match self.status() {
            Status::Existing => self.set_status(Status::ExistingModified),
            Status::ExistingModified | Status::New => Ok(()),
            Status::StaleModified | Status::StaleDestroyed => {
                // callers must check staleness before editing
                Err(StateError::StaleStateModified.into())
            }
            status => Err(StateError::CannotMarkModified { status }.into()),
        }
    }

    /// Transiently removes this session state: NEW states are discarded
    /// outright, existing ones are marked EXISTING_REMOVED until the
    /// removal is saved or reverted.
    pub fn remove(self: &Arc<Self>) -> crate::Result<()> {
        self.check_is_session_state()?;
        match self.status() {
            Status::New => self.set_status(Status::Removed),
            Status::Existing | Status::ExistingModified => {
                self.set_status(Status::ExistingRemoved)
            }
            Status::ExistingRemoved => Ok(()),
            status if status.is_terminal() => Err(StateError::Terminal { status }.into()),
            status => Err(StateError::CannotRemove { status }.into()),
        }
    }

    /// Reverts this session state and its materialized descendants to
    /// their pre-edit statuses. Every state that reverted itself is pushed
    /// onto `affected`.
    pub fn revert(self: &Arc<Self>, affected: &mut Vec<Arc<ItemState>>) -> crate::Result<()> {
        self.check_is_session_state()?;
        match self.status() {
            Status::ExistingModified | Status::StaleModified => {
                self.reset()?;
                self.set_status(Status::Existing)?;
                affected.push(self.clone());
            }
            Status::ExistingRemoved => {
                self.set_status(Status::Existing)?;
                affected.push(self.clone());
            }
            Status::New => {
                self.set_status(Status::Removed)?;
                affected.push(self.clone());
            }
            _ => {}
        }
        for child in self.session_children() {
            child.revert(affected)?;
        }
        Ok(())
    }

    /// Collects this session state and its materialized descendants that
    /// carry transient changes (NEW, EXISTING_MODIFIED, EXISTING_REMOVED).
    pub fn collect_transient_states(
        self: &Arc<Self>,
        transient: &mut Vec<Arc<ItemState>>,
    ) -> crate::Result<()> {
        self.check_is_session_state()?;
        if self.status().is_transient() {
            transient.push(self.clone());
        }
        for child in self.session_children() {
            child.collect_transient_states(transient)?;
        }
        Ok(())
    }

    /// Refreshes this session state recursively: transient changes are
    /// kept, clean states re-synchronize from their workspace twin.
    pub fn refresh(self: &Arc<Self>) -> crate::Result<()> {
        self.check_is_session_state()?;
        if self.status() == Status::Existing && self.has_overlayed_state() {
            self.reset()?;
        }
        for child in self.session_children() {
            child.refresh()?;
        }
        Ok(())
    }

    /// Invalidates this workspace state and its materialized descendants
    /// without re-reading them: data stays as cached, the status signals
    /// that it must be re-resolved before the next use. Propagates to
    /// connected session states through the listener protocol.
    pub fn invalidate(self: &Arc<Self>) -> crate::Result<()> {
        self.check_is_workspace_state()?;
        for child in self.cached_children() {
            child.invalidate()?;
        }
        if self.status() == Status::Existing {
            self.set_status(Status::Invalidated)?;
        }
        Ok(())
    }

    /// Applies an external change event to this workspace state: the
    /// state's own data is mutated accordingly, then the status machine is
    /// driven (MODIFIED pulse, or REMOVED when the event names the state
    /// itself). On error the status is left untouched.
    pub fn refresh_external(self: &Arc<Self>, event: &Event) -> crate::Result<()> {
        self.check_is_workspace_state()?;
        match &self.kind {
            ItemKind::Node(_) => self.refresh_node_external(event),
            ItemKind::Property(_) => self.refresh_property_external(event),
        }
    }

    //----------------------------------------------------------< internal >---

    /// Workspace-layer children that have been materialized through the
    /// weak reference caches.
    pub(super) fn cached_children(&self) -> Vec<Arc<ItemState>> {
        let ItemKind::Node(slot) = &self.kind else {
            return Vec::new();
        };
        let entries = slot.data.lock().unwrap().child_entries.clone();
        entries.iter().filter_map(|entry| entry.cached()).collect()
    }

    /// Session-layer children reachable from this state: a cached target
    /// that is itself a session state, or the session twin of a cached
    /// workspace target, found through the listener back-channel. Only
    /// materialized subtrees are visited; an unresolved child cannot carry
    /// transient changes.
    pub(super) fn session_children(&self) -> Vec<Arc<ItemState>> {
        let ItemKind::Node(slot) = &self.kind else {
            return Vec::new();
        };
        let entries = slot.data.lock().unwrap().child_entries.clone();
        let mut children = Vec::new();
        for entry in entries.iter() {
            let Some(state) = entry.cached() else {
                continue;
            };
            let session = if state.is_session_state() {
                Some(state)
            } else {
                state.session_state()
            };
            if let Some(child) = session {
                children.push(child);
            }
        }
        children
    }
}

impl ItemStateListener for ItemState {
    /// Reaction of a session state to transitions of its workspace twin.
    fn status_changed(&self, state: &Arc<ItemState>, _previous: Status) {
        if self.is_workspace_state() {
            tracing::error!("workspace state received a lifecycle notification");
            return;
        }
        let Some(overlayed) = self.overlayed_state() else {
            return;
        };
        if !Arc::ptr_eq(state, &overlayed) {
            return;
        }

        let me = self.me();
        match state.status() {
            Status::Modified => match self.status() {
                // clean or invalidated: re-synchronize and pulse onward
                Status::Existing | Status::Invalidated => {
                    if let Err(error) = self.reset() {
                        tracing::warn!(%error, "resynchronization from workspace twin failed");
                        return;
                    }
                    report(me.set_status(Status::Modified));
                }
                // local edits collide with the external change
                Status::ExistingModified => report(me.set_status(Status::StaleModified)),
                // local removal wins; nothing to synchronize
                Status::ExistingRemoved => {}
                other => {
                    tracing::debug!(status = %other, "ignoring workspace pulse");
                }
            },
            Status::Removed => {
                let target = if self.status() == Status::ExistingModified {
                    Status::StaleDestroyed
                } else {
                    Status::Removed
                };
                report(me.set_status(target));
            }
            Status::Invalidated => match self.status() {
                Status::Existing => report(me.set_status(Status::Invalidated)),
                // transient edits survive an invalidation of the twin
                other => {
                    tracing::debug!(status = %other, "keeping status across twin invalidation");
                }
            },
            other => {
                tracing::debug!(status = %other, "no session reaction to workspace status");
            }
        }
    }

    fn as_item_state(&self) -> Option<Arc<ItemState>> {
        Some(self.me())
    }
}

fn report(outcome: crate::Result<()>) {
    if let Err(error) = outcome {
        tracing::warn!(%error, "status propagation from workspace twin failed");
    }
}
