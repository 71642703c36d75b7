//! Error types for item-state operations.
//!
//! The variants fall into three families: misuse of the two-layer protocol
//! (wrong layer, rebinding, terminal statuses: the illegal-state family),
//! invalid inputs to the status gate (the illegal-argument family), and
//! resolution failures (unknown ids, vanished parents, and wrapped errors
//! from the underlying store).

use thiserror::Error;

use crate::event::EventKind;
use crate::id::ItemId;
use crate::state::Status;

/// Structured error type for state-layer operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StateError {
    /// A workspace-only operation was invoked on a session state.
    #[error("state is not a workspace state")]
    NotWorkspaceState,

    /// A session-only operation was invoked on a workspace state.
    #[error("state is not a session state")]
    NotSessionState,

    /// A session state was asked to connect to a second, different
    /// workspace state.
    #[error("state is already connected to another underlying state")]
    AlreadyConnected,

    /// The operation needs an overlayed workspace state, but the session
    /// state is not connected to one.
    #[error("state is not connected to an underlying state")]
    NotConnected,

    /// A state was constructed with a status that is not a legal starting
    /// point for its layer.
    #[error("illegal initial status {status:?}")]
    IllegalInitialStatus { status: Status },

    /// The state has reached a terminal status and admits no transitions.
    #[error("state is already in terminal status {status:?}")]
    Terminal { status: Status },

    /// The requested status change is not in the transition table of the
    /// state's layer.
    #[error("invalid status change from {from:?} to {to:?}")]
    InvalidStatusChange { from: Status, to: Status },

    /// A stale state cannot be marked modified; callers must check
    /// staleness before editing.
    #[error("cannot mark stale state modified")]
    StaleStateModified,

    /// The state's current status does not admit being marked modified.
    #[error("cannot mark state with status {status:?} modified")]
    CannotMarkModified { status: Status },

    /// The state's current status does not admit removal.
    #[error("cannot remove state with status {status:?}")]
    CannotRemove { status: Status },

    /// A reference resolved to an id the item-state manager does not know.
    #[error("no such item: {id}")]
    NoSuchItem { id: ItemId },

    /// Resolution or refresh failed in the underlying store.
    #[error("item state operation failed for {id}")]
    ItemStateError {
        id: ItemId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An item disappeared while it was being worked with, e.g. a parent
    /// reclaimed during path construction.
    #[error("item not found: {reason}")]
    ItemNotFound { reason: String },

    /// An event was delivered to a state that its kind cannot apply to.
    #[error("event kind {kind:?} does not apply to this state")]
    UnexpectedEvent { kind: EventKind },
}

impl StateError {
    /// Check if this error reports misuse of the two-layer state protocol.
    pub fn is_illegal_state(&self) -> bool {
        matches!(
            self,
            StateError::NotWorkspaceState
                | StateError::NotSessionState
                | StateError::AlreadyConnected
                | StateError::NotConnected
                | StateError::Terminal { .. }
                | StateError::StaleStateModified
                | StateError::CannotMarkModified { .. }
                | StateError::CannotRemove { .. }
        )
    }

    /// Check if this error reports an invalid argument to the status gate
    /// or the event surface.
    pub fn is_illegal_argument(&self) -> bool {
        matches!(
            self,
            StateError::IllegalInitialStatus { .. }
                | StateError::InvalidStatusChange { .. }
                | StateError::UnexpectedEvent { .. }
        )
    }

    /// Check if this error indicates an item could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StateError::NoSuchItem { .. } | StateError::ItemNotFound { .. }
        )
    }

    /// Check if this error wraps a failure of the underlying store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, StateError::ItemStateError { .. })
    }
}
