//! Item identifiers.
//!
//! A node is identified either by a stable UUID or, when it has no stable
//! identity of its own, by a relative path hanging off the nearest
//! UUID-anchored ancestor. A property is identified by its parent node id
//! plus its name. Two ids are equal exactly when they resolve to the same
//! item; path-based ids are kept anchor-normalized by the [`IdFactory`] so
//! that structural equality is sufficient.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::name::QName;
use crate::path::{Path, PathSegment};

/// Error type for identifier parsing.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum IdError {
    /// The textual form of a UUID could not be parsed.
    #[error("invalid uuid '{value}'")]
    InvalidUuid {
        value: String,
        #[source]
        source: uuid::Error,
    },
}

/// Identifier of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeId {
    /// A node with stable identity.
    Uuid(Uuid),
    /// A node addressed by a relative path from a UUID-anchored ancestor.
    Path { anchor: Uuid, path: Path },
}

impl NodeId {
    /// Parses a UUID-form node id from its textual representation.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        let uuid = Uuid::parse_str(value).map_err(|source| IdError::InvalidUuid {
            value: value.to_string(),
            source,
        })?;
        Ok(NodeId::Uuid(uuid))
    }

    /// Returns true if this id addresses the node by relative path rather
    /// than by stable identity.
    pub fn is_path_based(&self) -> bool {
        matches!(self, NodeId::Path { .. })
    }

    /// Returns the UUID anchor of this id: the node's own UUID, or the
    /// ancestor UUID a path-based id hangs off.
    pub fn anchor(&self) -> Uuid {
        match self {
            NodeId::Uuid(uuid) => *uuid,
            NodeId::Path { anchor, .. } => *anchor,
        }
    }

    /// Returns the relative path of a path-based id.
    pub fn relative_path(&self) -> Option<&Path> {
        match self {
            NodeId::Uuid(_) => None,
            NodeId::Path { path, .. } => Some(path),
        }
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        NodeId::Uuid(uuid)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Uuid(uuid) => write!(f, "{uuid}"),
            NodeId::Path { anchor, path } => write!(f, "{anchor}{path}"),
        }
    }
}

/// Identifier of a property: parent node id plus property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId {
    parent: NodeId,
    name: QName,
}

impl PropertyId {
    /// Creates a property id from its parent node id and name.
    pub fn new(parent: NodeId, name: QName) -> Self {
        Self { parent, name }
    }

    /// Returns the id of the parent node.
    pub fn parent_id(&self) -> &NodeId {
        &self.parent
    }

    /// Returns the property name.
    pub fn name(&self) -> &QName {
        &self.name
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.parent, self.name)
    }
}

/// Identifier of any item, node or property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemId {
    Node(NodeId),
    Property(PropertyId),
}

impl ItemId {
    /// Returns true if this id denotes a node.
    pub fn is_node(&self) -> bool {
        matches!(self, ItemId::Node(_))
    }

    /// Returns the node id, if this id denotes a node.
    pub fn as_node_id(&self) -> Option<&NodeId> {
        match self {
            ItemId::Node(id) => Some(id),
            ItemId::Property(_) => None,
        }
    }
}

impl From<NodeId> for ItemId {
    fn from(id: NodeId) -> Self {
        ItemId::Node(id)
    }
}

impl From<PropertyId> for ItemId {
    fn from(id: PropertyId) -> Self {
        ItemId::Property(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Node(id) => write!(f, "{id}"),
            ItemId::Property(id) => write!(f, "{id}"),
        }
    }
}

/// Mints identifiers for items discovered below already-identified nodes.
///
/// Implementations must be pure functions of their inputs; ids never depend
/// on wall-clock time or mint order.
pub trait IdFactory: Send + Sync {
    /// Creates the id of a node with stable identity.
    fn node_id(&self, uuid: Uuid) -> NodeId;

    /// Creates the id of a node without stable identity, addressed by one
    /// path step below `parent`. A path-based parent id is extended rather
    /// than nested, keeping ids anchor-normalized.
    fn relative_node_id(&self, parent: &NodeId, segment: PathSegment) -> NodeId;

    /// Creates a property id from the parent node id and the property name.
    fn property_id(&self, parent: &NodeId, name: &QName) -> PropertyId;
}

/// The straightforward [`IdFactory`] implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleIdFactory;

impl SimpleIdFactory {
    pub fn new() -> Self {
        Self
    }
}

impl IdFactory for SimpleIdFactory {
    fn node_id(&self, uuid: Uuid) -> NodeId {
        NodeId::Uuid(uuid)
    }

    fn relative_node_id(&self, parent: &NodeId, segment: PathSegment) -> NodeId {
        match parent {
            NodeId::Uuid(anchor) => NodeId::Path {
                anchor: *anchor,
                path: Path::root().join(segment),
            },
            NodeId::Path { anchor, path } => NodeId::Path {
                anchor: *anchor,
                path: path.join(segment),
            },
        }
    }

    fn property_id(&self, parent: &NodeId, name: &QName) -> PropertyId {
        PropertyId::new(parent.clone(), name.clone())
    }
}
