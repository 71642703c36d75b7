//! Node and property definition value holders.
//!
//! Definitions are looked up by an external resolver and attached to states
//! post-construction. The core only stores and hands them back; it performs
//! no schema validation against them.

use serde::{Deserialize, Serialize};

use crate::name::QName;

/// Definition applicable to a node, as resolved from its parent's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefinition {
    name: Option<QName>,
    default_primary_type: Option<QName>,
    allows_same_name_siblings: bool,
    auto_created: bool,
    protected: bool,
}

impl NodeDefinition {
    pub fn new(
        name: Option<QName>,
        default_primary_type: Option<QName>,
        allows_same_name_siblings: bool,
        auto_created: bool,
        protected: bool,
    ) -> Self {
        Self {
            name,
            default_primary_type,
            allows_same_name_siblings,
            auto_created,
            protected,
        }
    }

    /// The name this definition applies to; `None` is the residual
    /// (match-any) definition.
    pub fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    pub fn default_primary_type(&self) -> Option<&QName> {
        self.default_primary_type.as_ref()
    }

    pub fn allows_same_name_siblings(&self) -> bool {
        self.allows_same_name_siblings
    }

    pub fn is_auto_created(&self) -> bool {
        self.auto_created
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }
}

/// Definition applicable to a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    name: Option<QName>,
    multiple: bool,
    auto_created: bool,
    mandatory: bool,
    protected: bool,
}

impl PropertyDefinition {
    pub fn new(
        name: Option<QName>,
        multiple: bool,
        auto_created: bool,
        mandatory: bool,
        protected: bool,
    ) -> Self {
        Self {
            name,
            multiple,
            auto_created,
            mandatory,
            protected,
        }
    }

    /// The name this definition applies to; `None` is the residual
    /// (match-any) definition.
    pub fn name(&self) -> Option<&QName> {
        self.name.as_ref()
    }

    /// Returns true if the property holds a list of values.
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_auto_created(&self) -> bool {
        self.auto_created
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }
}
