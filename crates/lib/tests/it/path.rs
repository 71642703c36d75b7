//! Bottom-up qualified path construction.

use canopy::id::PropertyId;
use canopy::path::Path;
use canopy::state::{ItemState, Layer, Status};

use crate::helpers::*;

#[test]
fn root_state_has_the_root_path() {
    let root = workspace_root();
    let path = root.qpath().unwrap();
    assert!(path.is_root());
    assert_eq!(path, Path::root());
}

#[test]
fn single_child_elides_the_default_index() {
    let root = workspace_root();
    let child = workspace_child(&root, "foo");

    let path = child.qpath().unwrap();
    assert_eq!(path.depth(), 1);
    let segment = path.last().unwrap();
    assert_eq!(segment.name(), &qn("foo"));
    assert!(segment.has_default_index());
    assert_eq!(path.to_string(), "/foo");
}

#[test]
fn same_name_siblings_carry_explicit_indexes() {
    let root = workspace_root();
    let _first = workspace_child(&root, "foo");
    let second = workspace_child(&root, "foo");

    let path = second.qpath().unwrap();
    assert_eq!(path.to_string(), "/foo[2]");
    assert_eq!(path.last().unwrap().index(), 2);
}

#[test]
fn deep_paths_accumulate_segments_root_first() {
    let root = workspace_root();
    let a = workspace_child(&root, "a");
    let b = workspace_child(&a, "b");
    let c = workspace_child(&b, "c");

    assert_eq!(c.qpath().unwrap().to_string(), "/a/b/c");
}

#[test]
fn property_segments_have_no_index() {
    let root = workspace_root();
    let folder = workspace_child(&root, "folder");
    let property = ItemState::new_property(
        Layer::Workspace,
        Status::Existing,
        Some(&folder),
        PropertyId::new(folder.node_id(), qn("title")),
    )
    .unwrap();

    let path = property.qpath().unwrap();
    assert_eq!(path.to_string(), "/folder/title");
    assert!(path.last().unwrap().has_default_index());
}

#[test]
fn reclaimed_parent_fails_path_construction() {
    let root = workspace_root();
    let child = {
        let parent = workspace_child(&root, "doomed");
        workspace_child(&parent, "leaf")
        // parent goes out of scope here; only the root keeps an entry to it
    };

    // the intermediate state is gone: the entry cache is weak and the
    // child's parent link is weak, so nothing kept it alive
    let error = child.qpath().unwrap_err();
    assert!(error.is_not_found());
}

#[test]
fn vanished_child_entry_fails_path_construction() {
    let root = workspace_root();
    let child = workspace_child(&root, "foo");
    assert!(root.remove_child_node_entry(&qn("foo"), 1));

    // the parent is alive but no longer lists the child
    let error = child.qpath().unwrap_err();
    assert!(error.is_not_found());
}

#[test]
fn session_paths_track_the_session_collection() {
    let root = workspace_root();
    let workspace = workspace_child(&root, "foo");

    let session_root = session_overlay(&root, None);
    let session = ItemState::overlay_node(&workspace, Status::Existing, Some(&session_root))
        .unwrap();

    assert_eq!(session.qpath().unwrap().to_string(), "/foo");

    // a second sibling added only in the session shifts nothing for the
    // first, but gets its own explicit index
    let added = session_root.add_child_node_entry(qn("foo"), node_id());
    assert_eq!(session.qpath().unwrap().to_string(), "/foo");
    assert_eq!(added.index(), Some(2));
}
