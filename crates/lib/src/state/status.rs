//! Item status values and the status-transition tables.
//!
//! The legal transitions differ between the two layers. Workspace states
//! move between EXISTING, INVALIDATED and REMOVED, with MODIFIED as a
//! short-lived pulse that signals connected session states to resynchronize.
//! Session states additionally track transient edits (NEW, the
//! EXISTING_MODIFIED/EXISTING_REMOVED pair) and the stale statuses they fall
//! into when the workspace moves underneath them.
//!
//! REMOVED and STALE_DESTROYED are terminal: once reached, no further
//! transition is admitted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The status of an item state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Session state created locally; no workspace counterpart yet.
    New,
    /// In sync with the (last known) stored item.
    Existing,
    /// Session state carrying transient modifications.
    ExistingModified,
    /// Session state transiently marked for removal.
    ExistingRemoved,
    /// Transiently modified, but the workspace twin changed underneath.
    StaleModified,
    /// Transiently modified, but the workspace twin was removed.
    StaleDestroyed,
    /// Gone. Terminal.
    Removed,
    /// The stored item may have changed; data must be re-resolved before
    /// the next read.
    Invalidated,
    /// Transient signaling pulse: the state just resynchronized and its
    /// observers must follow suit. Never observed at rest; the status gate
    /// collapses it back to [`Status::Existing`] once listeners have run.
    Modified,
}

impl Status {
    /// Every status value, for exhaustive table walks.
    pub const ALL: [Status; 9] = [
        Status::New,
        Status::Existing,
        Status::ExistingModified,
        Status::ExistingRemoved,
        Status::StaleModified,
        Status::StaleDestroyed,
        Status::Removed,
        Status::Invalidated,
        Status::Modified,
    ];

    /// Returns true if this status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Removed | Status::StaleDestroyed)
    }

    /// Returns true if a state with this status is usable for reads and
    /// edits.
    pub fn is_valid(self) -> bool {
        matches!(
            self,
            Status::New | Status::Existing | Status::ExistingModified
        )
    }

    /// Returns true if the workspace twin moved underneath local edits.
    pub fn is_stale(self) -> bool {
        matches!(self, Status::StaleModified | Status::StaleDestroyed)
    }

    /// Returns true if a session state with this status carries transient
    /// changes that a save would submit.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Status::New | Status::ExistingModified | Status::ExistingRemoved
        )
    }

    /// Validates a status change on the given layer. Identity changes are
    /// handled (as no-ops) before the gate consults this table, so `from ==
    /// to` is not part of it.
    pub fn is_valid_change(from: Status, to: Status, is_workspace: bool) -> bool {
        use Status::*;
        if is_workspace {
            match from {
                Existing => matches!(to, Modified | Removed | Invalidated),
                Invalidated => matches!(to, Existing | Removed),
                Modified => matches!(to, Existing),
                _ => false,
            }
        } else {
            match from {
                New => matches!(to, Existing | Removed),
                Existing => matches!(
                    to,
                    ExistingModified | ExistingRemoved | Invalidated | Modified | Removed
                ),
                ExistingModified => {
                    matches!(to, Existing | ExistingRemoved | StaleModified | StaleDestroyed)
                }
                ExistingRemoved => matches!(to, Removed | Existing),
                Invalidated => matches!(to, Existing | Modified | Removed),
                StaleModified => matches!(to, Existing | Removed),
                Modified => matches!(to, Existing),
                _ => false,
            }
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::New => "new",
            Status::Existing => "existing",
            Status::ExistingModified => "existing-modified",
            Status::ExistingRemoved => "existing-removed",
            Status::StaleModified => "stale-modified",
            Status::StaleDestroyed => "stale-destroyed",
            Status::Removed => "removed",
            Status::Invalidated => "invalidated",
            Status::Modified => "modified",
        };
        write!(f, "{name}")
    }
}
