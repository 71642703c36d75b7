//! The change log: the batch of transient states a save submits.
//!
//! The outer session collects the transient states of the edited subtree
//! and hands the batch to the remote store. Only after the store reports
//! success does it call [`ChangeLog::applied`] to reconcile the two layers:
//! additions become existing, modifications are pushed onto the workspace
//! twins (whose MODIFIED pulse re-synchronizes every connected session
//! state), and removals drive the twins to REMOVED so the listener cascade
//! detaches the session layer.

use std::sync::Arc;

use crate::state::item::ItemState;
use crate::state::status::Status;

/// A batch of session-state mutations submitted for commit, partitioned by
/// the kind of change.
#[derive(Debug, Default)]
pub struct ChangeLog {
    added: Vec<Arc<ItemState>>,
    modified: Vec<Arc<ItemState>>,
    removed: Vec<Arc<ItemState>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the transient states of the session subtree rooted at
    /// `root`. Only materialized descendants are walked; property states
    /// resolved outside the node tree are recorded via [`ChangeLog::record`]
    /// by the outer session.
    pub fn collect(root: &Arc<ItemState>) -> crate::Result<ChangeLog> {
        let mut transient = Vec::new();
        root.collect_transient_states(&mut transient)?;
        let mut log = ChangeLog::new();
        for state in transient {
            log.record(state);
        }
        Ok(log)
    }

    /// Records one transient session state in the batch. States without
    /// transient changes are ignored.
    pub fn record(&mut self, state: Arc<ItemState>) {
        match state.status() {
            Status::New => self.added.push(state),
            Status::ExistingModified => self.modified.push(state),
            Status::ExistingRemoved => self.removed.push(state),
            status => {
                tracing::debug!(status = %status, "ignoring non-transient state");
            }
        }
    }

    /// States created in this session.
    pub fn added(&self) -> &[Arc<ItemState>] {
        &self.added
    }

    /// States modified in this session.
    pub fn modified(&self) -> &[Arc<ItemState>] {
        &self.modified
    }

    /// States transiently removed in this session.
    pub fn removed(&self) -> &[Arc<ItemState>] {
        &self.removed
    }

    /// Returns true if the batch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Number of states in the batch.
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }

    /// Reconciles the two layers after the store accepted this batch.
    ///
    /// Added states simply become EXISTING; their workspace counterpart is
    /// minted by the factory on next resolution. Modified states first rest
    /// at EXISTING, then push their data onto the workspace twin; the
    /// twin's MODIFIED pulse re-synchronizes every session state connected
    /// to it, including the one that committed. Removed states drive their
    /// twin to REMOVED and the listener cascade detaches the session layer.
    ///
    /// An error stops reconciliation; the failing state keeps its
    /// pre-reconciliation status.
    pub fn applied(&self) -> crate::Result<()> {
        for state in &self.added {
            state.set_status(Status::Existing)?;
        }
        for state in &self.modified {
            state.set_status(Status::Existing)?;
            if let Some(workspace) = state.overlayed_state() {
                workspace.commit_data_from(state)?;
            }
        }
        for state in &self.removed {
            match state.overlayed_state() {
                Some(workspace) => workspace.set_status(Status::Removed)?,
                None => state.set_status(Status::Removed)?,
            }
        }
        Ok(())
    }
}
