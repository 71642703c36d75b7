//! The item-state overlay and lifecycle engine.
//!
//! This module is the core of the crate. It models every repository item as
//! a pair of states, an authoritative *workspace* state fed by external
//! events and a transient *session* state holding unsaved edits, linked by
//! a weak lifecycle-listener protocol and a strict status machine.
//!
//! The pieces, leaves first:
//!
//! * [`Status`] and its per-layer transition tables ([`status`]).
//! * The weak identity listener collection and the two listener surfaces
//!   ([`listener`]).
//! * [`ChildNodeEntry`]: ordered-collection membership plus weakly cached
//!   lazy resolution of the child state ([`entry`]).
//! * [`ChildNodeEntries`]: the insertion-ordered, same-name-sibling-aware
//!   child collection ([`children`]).
//! * [`ItemState`] with its node and property payloads ([`item`], [`node`],
//!   [`property`]).
//! * [`ChangeLog`]: the commit batch and the post-save reconciliation
//!   ([`changelog`]).
//! * The [`ItemStateFactory`]/[`ItemStateManager`] boundary the core
//!   resolves through ([`manager`]).

pub mod changelog;
pub mod children;
pub mod entry;
pub mod errors;
pub mod item;
pub mod listener;
pub mod manager;
pub mod node;
pub mod property;
pub mod status;

pub use changelog::ChangeLog;
pub use children::ChildNodeEntries;
pub use entry::ChildNodeEntry;
pub use errors::StateError;
pub use item::{ItemState, Layer};
pub use listener::{ItemStateListener, NodeStateListener};
pub use manager::{ItemStateFactory, ItemStateManager};
pub use property::PropertyValue;
pub use status::Status;
