//! The insertion-ordered child collection.
//!
//! `ChildNodeEntries` keeps three views over the same entries: the global
//! insertion order, an id index for O(1) lookup, and a per-name index whose
//! lists carry the 1-based same-name-sibling positions. The per-name lists
//! always mirror the global order filtered by name; every mutation
//! maintains that invariant.
//!
//! Cloning is shallow: the index structures are rebuilt, the entries
//! themselves are shared. Copy-on-write across paired states is realized
//! one level up by handing out `Arc<ChildNodeEntries>` handles (see the
//! node-state operations).

use std::collections::HashMap;
use std::sync::Arc;

use crate::id::NodeId;
use crate::name::QName;
use crate::state::entry::ChildNodeEntry;

/// Insertion-ordered collection of child node entries with same-name
/// sibling support.
#[derive(Debug, Default, Clone)]
pub struct ChildNodeEntries {
    order: Vec<Arc<ChildNodeEntry>>,
    by_id: HashMap<NodeId, Arc<ChildNodeEntry>>,
    by_name: HashMap<QName, Vec<Arc<ChildNodeEntry>>>,
}

impl ChildNodeEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Iterates the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ChildNodeEntry>> {
        self.order.iter()
    }

    /// Returns the entry with the given id.
    pub fn get(&self, id: &NodeId) -> Option<Arc<ChildNodeEntry>> {
        self.by_id.get(id).cloned()
    }

    /// Returns the same-name-sibling list for `name` in insertion order;
    /// empty if the name is absent. The returned list is a snapshot.
    pub fn get_name(&self, name: &QName) -> Vec<Arc<ChildNodeEntry>> {
        self.by_name.get(name).cloned().unwrap_or_default()
    }

    /// Returns the entry at the 1-based same-name-sibling position, or
    /// `None` when the position is out of range.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0; same-name-sibling indexes are 1-based.
    pub fn get_indexed(&self, name: &QName, index: u32) -> Option<Arc<ChildNodeEntry>> {
        assert!(index >= 1, "same-name-sibling index is 1-based");
        self.by_name
            .get(name)?
            .get(index as usize - 1)
            .cloned()
    }

    /// Returns the 1-based position of the entry with `id` within the
    /// same-name-sibling list for `name`.
    pub fn index_of(&self, name: &QName, id: &NodeId) -> Option<u32> {
        let siblings = self.by_name.get(name)?;
        siblings
            .iter()
            .position(|entry| entry.node_id() == id)
            .map(|position| position as u32 + 1)
    }

    /// Returns the position of the entry with `id` in the global insertion
    /// order.
    pub fn position(&self, id: &NodeId) -> Option<usize> {
        self.order.iter().position(|entry| entry.node_id() == id)
    }

    /// Appends an entry. It joins the tail of both the global order and its
    /// same-name-sibling list. A pre-existing entry with the same id is
    /// replaced (child ids are unique within a collection).
    pub fn add(&mut self, entry: Arc<ChildNodeEntry>) -> Arc<ChildNodeEntry> {
        if self.by_id.contains_key(entry.node_id()) {
            self.remove(entry.node_id());
        }
        self.by_id.insert(entry.node_id().clone(), entry.clone());
        self.by_name
            .entry(entry.name().clone())
            .or_default()
            .push(entry.clone());
        self.order.push(entry.clone());
        entry
    }

    /// Appends every entry of `entries`, preserving their order.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = Arc<ChildNodeEntry>>) {
        for entry in entries {
            self.add(entry);
        }
    }

    /// Removes the entry at the 1-based same-name-sibling position.
    /// Removing an absent name or an out-of-range position returns `None`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0; same-name-sibling indexes are 1-based.
    pub fn remove_indexed(&mut self, name: &QName, index: u32) -> Option<Arc<ChildNodeEntry>> {
        assert!(index >= 1, "same-name-sibling index is 1-based");
        let siblings = self.by_name.get_mut(name)?;
        if index as usize > siblings.len() {
            return None;
        }
        let removed = siblings.remove(index as usize - 1);
        if siblings.is_empty() {
            self.by_name.remove(name);
        }
        self.by_id.remove(removed.node_id());
        self.order
            .retain(|entry| !Arc::ptr_eq(entry, &removed));
        Some(removed)
    }

    /// Removes the entry with the given id.
    pub fn remove(&mut self, id: &NodeId) -> Option<Arc<ChildNodeEntry>> {
        let entry = self.by_id.get(id).cloned()?;
        let index = self.index_of(entry.name(), id)?;
        self.remove_indexed(&entry.name().clone(), index)
    }

    /// Removes the given entry.
    pub fn remove_entry(&mut self, entry: &Arc<ChildNodeEntry>) -> Option<Arc<ChildNodeEntry>> {
        self.remove(entry.node_id())
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.order.clear();
        self.by_id.clear();
        self.by_name.clear();
    }

    /// Moves the entry with `id` so that it precedes the entry with
    /// `before`, or to the tail when `before` is `None`. Returns false when
    /// either id is absent.
    pub fn reorder(&mut self, id: &NodeId, before: Option<&NodeId>) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let moved = self.order.remove(from);
        match before {
            Some(before_id) => {
                let Some(to) = self.position(before_id) else {
                    self.order.insert(from, moved);
                    return false;
                };
                self.order.insert(to, moved);
            }
            None => self.order.push(moved),
        }
        self.rebuild_name_index();
        true
    }

    /// Entries present here but absent from `other`, in insertion order.
    /// Presence matches on (name, id) and disregards the index.
    pub fn difference(&self, other: &ChildNodeEntries) -> Vec<Arc<ChildNodeEntry>> {
        self.order
            .iter()
            .filter(|entry| match other.by_id.get(entry.node_id()) {
                Some(counterpart) => !entry.same_child(counterpart),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// Entries present both here and in `other`, in this collection's
    /// insertion order. Presence matches on (name, id) and disregards the
    /// index.
    pub fn intersection(&self, other: &ChildNodeEntries) -> Vec<Arc<ChildNodeEntry>> {
        self.order
            .iter()
            .filter(|entry| match other.by_id.get(entry.node_id()) {
                Some(counterpart) => entry.same_child(counterpart),
                None => false,
            })
            .cloned()
            .collect()
    }

    // The per-name lists mirror the global order filtered by name.
    fn rebuild_name_index(&mut self) {
        self.by_name.clear();
        for entry in &self.order {
            self.by_name
                .entry(entry.name().clone())
                .or_default()
                .push(entry.clone());
        }
    }
}
