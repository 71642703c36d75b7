//!
//! Canopy: a transactional item-state overlay engine for hierarchical
//! content repository clients.
//!
//! ## Core Concepts
//!
//! * **Workspace states** (`state::ItemState` on `state::Layer::Workspace`): the
//!   in-memory cache of a remote node or property as the store last reported it.
//!   External change events drive their lifecycle.
//! * **Session states** (`state::ItemState` on `state::Layer::Session`): editable,
//!   transient overlays of workspace states, visible only to the owning session
//!   until committed. A session state `connect`s to its workspace twin and tracks
//!   its transitions through a weak listener protocol.
//! * **Child collection** (`state::ChildNodeEntries`): the insertion-ordered,
//!   same-name-sibling-aware collection of child entries, shared copy-on-write
//!   between paired states.
//! * **Child references** (`state::ChildNodeEntry`): weakly cached lazy links
//!   from a parent state to its children, resolved through the
//!   factory/manager boundary (`state::ItemStateFactory`,
//!   `state::ItemStateManager`).
//! * **Change log** (`state::ChangeLog`): the batch of transient mutations a
//!   save submits, and the post-commit reconciliation of the two layers.
//! * **Identifiers and paths** (`id`, `name`, `path`): value types for
//!   UUID/path node ids, property ids, qualified names, and structured paths
//!   with 1-based same-name-sibling indexes.

pub mod event;
pub mod id;
pub mod name;
pub mod nodetype;
pub mod path;
pub mod state;

/// Re-export of the central state type for easier access.
pub use state::ItemState;

/// Result type used throughout the Canopy library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Canopy library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured state-layer errors: protocol misuse, status-gate
    /// violations, and resolution failures.
    #[error(transparent)]
    State(#[from] state::StateError),

    /// Path composition failed.
    #[error(transparent)]
    Path(#[from] path::PathError),

    /// Identifier parsing failed.
    #[error(transparent)]
    Id(#[from] id::IdError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::State(_) => "state",
            Error::Path(_) => "path",
            Error::Id(_) => "id",
        }
    }

    /// Check if this error indicates an item could not be found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::State(state_err) => state_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error reports misuse of the two-layer state protocol.
    pub fn is_illegal_state(&self) -> bool {
        match self {
            Error::State(state_err) => state_err.is_illegal_state(),
            _ => false,
        }
    }

    /// Check if this error reports an invalid argument, including invalid
    /// status transitions and malformed paths.
    pub fn is_illegal_argument(&self) -> bool {
        match self {
            Error::State(state_err) => state_err.is_illegal_argument(),
            Error::Path(_) | Error::Id(_) => true,
        }
    }

    /// Check if this error wraps a failure of the underlying store.
    pub fn is_store_error(&self) -> bool {
        match self {
            Error::State(state_err) => state_err.is_store_error(),
            _ => false,
        }
    }
}
