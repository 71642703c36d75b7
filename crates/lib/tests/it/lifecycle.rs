//! Cross-layer lifecycle: connect semantics, propagation from workspace to
//! session states, transient edits, revert, and refresh.

use std::sync::Arc;

use canopy::state::{ItemState, Layer, Status};

use crate::helpers::*;

#[test]
fn connect_is_one_shot() {
    let first = workspace_root();
    let second = workspace_root();
    let session = session_overlay(&first, None);

    // reconnecting the same twin is a no-op
    session.connect(&first).unwrap();

    // rebinding to a different twin is refused
    let error = session.connect(&second).unwrap_err();
    assert!(error.is_illegal_state());
    assert!(Arc::ptr_eq(&session.overlayed_state().unwrap(), &first));
}

#[test]
fn connect_checks_both_layers() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);

    // a workspace state cannot connect to anything
    let error = workspace.connect(&workspace_root()).unwrap_err();
    assert!(error.is_illegal_state());

    // and a session state is no connection target
    let other = ItemState::new_node(
        Layer::Session,
        Status::New,
        None,
        node_id(),
        qn("n"),
        qn("t"),
    )
    .unwrap();
    let error = other.connect(&session).unwrap_err();
    assert!(error.is_illegal_state());
}

#[test]
fn workspace_and_session_accessors() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);

    assert!(workspace.is_workspace_state());
    assert!(session.is_session_state());
    assert!(session.has_overlayed_state());
    assert!(Arc::ptr_eq(&session.workspace_state().unwrap(), &workspace));
    assert!(Arc::ptr_eq(&workspace.workspace_state().unwrap(), &workspace));

    // the workspace finds its session overlay through the weak listener
    // back-channel
    assert!(Arc::ptr_eq(&workspace.session_state().unwrap(), &session));
    assert!(session.session_state().is_none());

    // once the session overlay is dropped, the back-channel goes dark
    drop(session);
    assert!(workspace.session_state().is_none());

    // a NEW state has no workspace side at all
    let fresh = ItemState::new_node(
        Layer::Session,
        Status::New,
        None,
        node_id(),
        qn("n"),
        qn("t"),
    )
    .unwrap();
    assert!(fresh.workspace_state().is_none());
}

#[test]
fn workspace_modification_resynchronizes_clean_session() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);
    let listener = Arc::new(RecordingListener::default());
    listen(&session, &listener);

    // external change reaches the workspace twin
    workspace.add_property_name(qn("external"));
    workspace.set_status(Status::Modified).unwrap();

    // the session resynchronized, pulsed, and rests at EXISTING
    assert_eq!(session.status(), Status::Existing);
    assert!(session.has_property_name(&qn("external")));
    assert_eq!(
        listener.transitions(),
        vec![(Status::Existing, Status::Modified)]
    );
}

#[test]
fn workspace_modification_stales_modified_session() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);
    session.mark_modified().unwrap();
    session.add_property_name(qn("local"));

    workspace.add_property_name(qn("external"));
    workspace.set_status(Status::Modified).unwrap();

    // local edits are preserved, the state is flagged stale
    assert_eq!(session.status(), Status::StaleModified);
    assert!(session.has_property_name(&qn("local")));
    assert!(!session.has_property_name(&qn("external")));
}

#[test]
fn workspace_removal_destroys_modified_session() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);
    session.mark_modified().unwrap();

    workspace.set_status(Status::Removed).unwrap();
    assert_eq!(session.status(), Status::StaleDestroyed);

    // terminal: nothing moves it anymore
    let error = session.set_status(Status::Existing).unwrap_err();
    assert!(error.is_illegal_state());
    assert_eq!(session.status(), Status::StaleDestroyed);
}

#[test]
fn workspace_removal_detaches_clean_session() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);

    workspace.set_status(Status::Removed).unwrap();
    assert_eq!(session.status(), Status::Removed);
}

#[test]
fn workspace_removal_finishes_transient_removal() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);
    session.remove().unwrap();
    assert_eq!(session.status(), Status::ExistingRemoved);

    workspace.set_status(Status::Removed).unwrap();
    assert_eq!(session.status(), Status::Removed);
}

#[test]
fn invalidation_propagates_to_clean_sessions_only() {
    let clean_ws = workspace_root();
    let clean = session_overlay(&clean_ws, None);
    let dirty_ws = workspace_root();
    let dirty = session_overlay(&dirty_ws, None);
    dirty.mark_modified().unwrap();

    clean_ws.invalidate().unwrap();
    dirty_ws.invalidate().unwrap();

    assert_eq!(clean.status(), Status::Invalidated);
    // transient edits survive the twin's invalidation
    assert_eq!(dirty.status(), Status::ExistingModified);
}

#[test]
fn invalidation_walks_materialized_descendants() {
    let root = workspace_root();
    let child = workspace_child(&root, "child");
    let grandchild = workspace_child(&child, "grandchild");

    root.invalidate().unwrap();

    assert_eq!(root.status(), Status::Invalidated);
    assert_eq!(child.status(), Status::Invalidated);
    assert_eq!(grandchild.status(), Status::Invalidated);

    // re-resolution brings the workspace state back
    root.set_status(Status::Existing).unwrap();
    assert_eq!(root.status(), Status::Existing);
}

#[test]
fn invalidated_session_resyncs_on_next_workspace_pulse() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);

    workspace.invalidate().unwrap();
    assert_eq!(session.status(), Status::Invalidated);

    // the manager re-resolves the workspace state and pulses
    workspace.set_status(Status::Existing).unwrap();
    workspace.add_property_name(qn("fresh"));
    workspace.set_status(Status::Modified).unwrap();

    assert_eq!(session.status(), Status::Existing);
    assert!(session.has_property_name(&qn("fresh")));
}

#[test]
fn mark_modified_rules() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);

    session.mark_modified().unwrap();
    assert_eq!(session.status(), Status::ExistingModified);

    // marking again is a silent no-op
    session.mark_modified().unwrap();
    assert_eq!(session.status(), Status::ExistingModified);

    // NEW states stay NEW
    let fresh = ItemState::new_node(
        Layer::Session,
        Status::New,
        None,
        node_id(),
        qn("n"),
        qn("t"),
    )
    .unwrap();
    fresh.mark_modified().unwrap();
    assert_eq!(fresh.status(), Status::New);

    // stale states refuse the edit
    workspace.set_status(Status::Modified).unwrap();
    assert_eq!(session.status(), Status::StaleModified);
    let error = session.mark_modified().unwrap_err();
    assert!(error.is_illegal_state());
    assert_eq!(session.status(), Status::StaleModified);

    // so do transiently removed states
    let removed_session = session_overlay(&workspace_root(), None);
    removed_session.remove().unwrap();
    let error = removed_session.mark_modified().unwrap_err();
    assert!(error.is_illegal_state());

    // and the whole surface is session-only
    assert!(workspace.mark_modified().unwrap_err().is_illegal_state());
}

#[test]
fn remove_rules() {
    // NEW is discarded outright
    let fresh = ItemState::new_node(
        Layer::Session,
        Status::New,
        None,
        node_id(),
        qn("n"),
        qn("t"),
    )
    .unwrap();
    fresh.remove().unwrap();
    assert_eq!(fresh.status(), Status::Removed);

    // existing states are transiently removed, repeatably
    let session = session_overlay(&workspace_root(), None);
    session.remove().unwrap();
    session.remove().unwrap();
    assert_eq!(session.status(), Status::ExistingRemoved);

    // modified states can be removed too
    let modified = session_overlay(&workspace_root(), None);
    modified.mark_modified().unwrap();
    modified.remove().unwrap();
    assert_eq!(modified.status(), Status::ExistingRemoved);

    // workspace states are not removable through this surface
    let workspace = workspace_root();
    assert!(workspace.remove().unwrap_err().is_illegal_state());
}

#[test]
fn revert_restores_the_session_subtree() {
    let ws_root = workspace_root();
    let ws_modified = workspace_child(&ws_root, "modified");
    let ws_removed = workspace_child(&ws_root, "removed");

    let root = session_overlay(&ws_root, None);
    let modified = session_child(&root, &ws_modified);
    let removed = session_child(&root, &ws_removed);

    modified.mark_modified().unwrap();
    modified.add_property_name(qn("edit"));
    removed.remove().unwrap();
    let fresh = ItemState::new_node(
        Layer::Session,
        Status::New,
        Some(&root),
        node_id(),
        qn("fresh"),
        qn("t"),
    )
    .unwrap();
    let entry = root.add_child_node_entry(qn("fresh"), fresh.node_id());
    entry.attach(&fresh);

    let mut affected = Vec::new();
    root.revert(&mut affected).unwrap();

    assert_eq!(modified.status(), Status::Existing);
    assert!(!modified.has_property_name(&qn("edit")));
    assert_eq!(removed.status(), Status::Existing);
    assert_eq!(fresh.status(), Status::Removed);

    // exactly the states that reverted themselves are reported
    assert_eq!(affected.len(), 3);
    assert!(affected.iter().any(|state| Arc::ptr_eq(state, &modified)));
    assert!(affected.iter().any(|state| Arc::ptr_eq(state, &removed)));
    assert!(affected.iter().any(|state| Arc::ptr_eq(state, &fresh)));

    // the untouched root did not revert
    assert!(!affected.iter().any(|state| Arc::ptr_eq(state, &root)));
}

#[test]
fn revert_resynchronizes_stale_states() {
    let workspace = workspace_root();
    let session = session_overlay(&workspace, None);
    session.mark_modified().unwrap();
    session.add_property_name(qn("local"));

    workspace.add_property_name(qn("external"));
    workspace.set_status(Status::Modified).unwrap();
    assert_eq!(session.status(), Status::StaleModified);

    let mut affected = Vec::new();
    session.revert(&mut affected).unwrap();

    // the stale edit is gone, the external change is in
    assert_eq!(session.status(), Status::Existing);
    assert!(!session.has_property_name(&qn("local")));
    assert!(session.has_property_name(&qn("external")));
    assert_eq!(affected.len(), 1);
}

#[test]
fn refresh_updates_clean_and_keeps_dirty() {
    let ws_root = workspace_root();
    let ws_clean = workspace_child(&ws_root, "clean");
    let ws_dirty = workspace_child(&ws_root, "dirty");

    let root = session_overlay(&ws_root, None);
    let clean = session_child(&root, &ws_clean);
    let dirty = session_child(&root, &ws_dirty);
    dirty.mark_modified().unwrap();
    dirty.add_property_name(qn("local"));

    // external changes land in the workspace layer without a pulse
    ws_clean.add_property_name(qn("external"));
    ws_dirty.add_property_name(qn("external"));

    root.refresh().unwrap();

    assert!(clean.has_property_name(&qn("external")));
    assert_eq!(clean.status(), Status::Existing);
    // the dirty overlay keeps its edits and sees nothing
    assert!(dirty.has_property_name(&qn("local")));
    assert!(!dirty.has_property_name(&qn("external")));
    assert_eq!(dirty.status(), Status::ExistingModified);
}

#[test]
fn reset_requires_a_twin() {
    let floating = ItemState::new_node(
        Layer::Session,
        Status::New,
        None,
        node_id(),
        qn("n"),
        qn("t"),
    )
    .unwrap();
    assert!(floating.reset().unwrap_err().is_illegal_state());

    let workspace = workspace_root();
    assert!(workspace.reset().unwrap_err().is_illegal_state());
}
