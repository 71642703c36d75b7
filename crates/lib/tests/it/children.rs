//! The ordered child collection as exposed by node states: same-name
//! siblings, index contiguity, and structural notifications.

use std::sync::{Arc, Mutex};

use canopy::id::NodeId;
use canopy::name::QName;
use canopy::state::{ItemState, NodeStateListener};

use crate::helpers::*;

#[test]
fn sns_indexes_are_contiguous_from_one() {
    let parent = workspace_root();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let id = node_id();
        parent.add_child_node_entry(qn("copy"), id.clone());
        ids.push(id);
    }
    parent.add_child_node_entry(qn("other"), node_id());

    for (position, id) in ids.iter().enumerate() {
        assert_eq!(
            parent.child_node_index(&qn("copy"), id),
            Some(position as u32 + 1)
        );
    }

    // removal closes the gap; the remainder is re-indexed contiguously
    assert!(parent.remove_child_node_entry(&qn("copy"), 2));
    assert_eq!(parent.child_node_index(&qn("copy"), &ids[0]), Some(1));
    assert_eq!(parent.child_node_index(&qn("copy"), &ids[1]), None);
    assert_eq!(parent.child_node_index(&qn("copy"), &ids[2]), Some(2));
}

#[test]
fn entries_report_their_index_live() {
    let parent = workspace_root();
    let first = parent.add_child_node_entry(qn("copy"), node_id());
    let second = parent.add_child_node_entry(qn("copy"), node_id());

    assert_eq!(first.index(), Some(1));
    assert_eq!(second.index(), Some(2));

    // the index is derived from the current collection, never cached
    assert!(parent.remove_child_node_entry(&qn("copy"), 1));
    assert_eq!(second.index(), Some(1));
    assert_eq!(first.index(), None);
}

#[test]
fn lookup_by_name_index_and_id() {
    let parent = workspace_root();
    let a = parent.add_child_node_entry(qn("a"), node_id());
    let b1 = parent.add_child_node_entry(qn("b"), node_id());
    let b2 = parent.add_child_node_entry(qn("b"), node_id());

    assert!(parent.has_child_node_entries());
    assert!(parent.has_child_node_entry(&qn("a")));
    assert!(!parent.has_child_node_entry(&qn("missing")));

    let found = parent.child_node_entry(&qn("b"), 2).unwrap();
    assert!(Arc::ptr_eq(&found, &b2));
    assert!(parent.child_node_entry(&qn("b"), 3).is_none());

    let by_id = parent.child_node_entry_by_id(a.node_id()).unwrap();
    assert!(Arc::ptr_eq(&by_id, &a));

    let named = parent.child_node_entries_named(&qn("b"));
    assert_eq!(named.len(), 2);
    assert!(Arc::ptr_eq(&named[0], &b1));

    let all = parent.child_node_entries();
    assert_eq!(all.len(), 3);
    assert!(Arc::ptr_eq(&all[0], &a));
}

/// Structural listener recording (name, index, kind) triples.
#[derive(Default)]
struct StructureProbe {
    log: Mutex<Vec<String>>,
}

impl StructureProbe {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl NodeStateListener for StructureProbe {
    fn node_added(&self, _parent: &Arc<ItemState>, name: &QName, index: u32, _id: &NodeId) {
        self.log.lock().unwrap().push(format!("added {name}[{index}]"));
    }

    fn node_removed(&self, _parent: &Arc<ItemState>, name: &QName, index: u32, _id: &NodeId) {
        self.log
            .lock()
            .unwrap()
            .push(format!("removed {name}[{index}]"));
    }

    fn nodes_replaced(&self, _parent: &Arc<ItemState>) {
        self.log.lock().unwrap().push("replaced".to_string());
    }
}

fn probe(parent: &Arc<ItemState>) -> Arc<StructureProbe> {
    let probe = Arc::new(StructureProbe::default());
    let handle: Arc<dyn NodeStateListener> = probe.clone();
    parent.add_node_listener(&handle);
    probe
}

#[test]
fn structural_notifications_fire_for_mutations() {
    let parent = workspace_root();
    let probe = probe(&parent);

    parent.add_child_node_entry(qn("a"), node_id());
    parent.add_child_node_entry(qn("a"), node_id());
    parent.remove_child_node_entry(&qn("a"), 1);
    parent.set_child_node_entries(vec![(qn("z"), node_id())]);

    assert_eq!(
        probe.log(),
        vec!["added a[1]", "added a[2]", "removed a[1]", "replaced"]
    );
}

#[test]
fn rename_fires_removed_then_added() {
    let parent = workspace_root();
    let id = node_id();
    parent.add_child_node_entry(qn("old"), id.clone());
    parent.add_child_node_entry(qn("fresh"), node_id());
    let probe = probe(&parent);

    assert!(parent.rename_child_node_entry(&qn("old"), 1, qn("fresh")));
    assert_eq!(probe.log(), vec!["removed old[1]", "added fresh[2]"]);
    assert_eq!(parent.child_node_index(&qn("fresh"), &id), Some(2));

    // renaming an absent entry reports failure and fires nothing
    assert!(!parent.rename_child_node_entry(&qn("old"), 1, qn("fresh")));
    assert_eq!(probe.log().len(), 2);
}

#[test]
fn reorder_notifies_replacement() {
    let parent = workspace_root();
    let a = parent.add_child_node_entry(qn("a"), node_id());
    let b = parent.add_child_node_entry(qn("b"), node_id());
    let probe = probe(&parent);

    assert!(parent.reorder_child_node_entry(b.node_id(), Some(a.node_id())));
    assert_eq!(probe.log(), vec!["replaced"]);

    let order: Vec<_> = parent
        .child_node_entries()
        .iter()
        .map(|entry| entry.name().clone())
        .collect();
    assert_eq!(order, vec![qn("b"), qn("a")]);

    assert!(!parent.reorder_child_node_entry(&node_id(), None));
}

#[test]
fn copy_on_write_isolation_between_paired_states() {
    let workspace = workspace_root();
    workspace.add_child_node_entry(qn("kept"), node_id());
    let session = session_overlay(&workspace, None);

    // session mutation is invisible to the workspace twin
    session.add_child_node_entry(qn("mine"), node_id());
    assert_eq!(session.child_node_entries().len(), 2);
    assert_eq!(workspace.child_node_entries().len(), 1);

    // and a workspace mutation is invisible to the session
    workspace.add_child_node_entry(qn("theirs"), node_id());
    assert_eq!(workspace.child_node_entries().len(), 2);
    assert!(!session.has_child_node_entry(&qn("theirs")));
}

#[test]
fn property_name_set_is_isolated_too() {
    let workspace = workspace_root();
    workspace.add_property_name(qn("shared"));
    let session = session_overlay(&workspace, None);

    session.add_property_name(qn("mine"));
    assert!(!workspace.has_property_name(&qn("mine")));

    workspace.add_property_name(qn("theirs"));
    assert!(!session.has_property_name(&qn("theirs")));
    assert!(session.has_property_name(&qn("shared")));
}
