//! Qualified names used throughout Canopy.
//!
//! A [`QName`] pairs a namespace URI with a local name. Both halves are
//! stored as `Arc<str>` for cheap cloning across thread boundaries; equality
//! and hashing are purely value based, so two independently constructed
//! names compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A qualified item name: namespace URI plus local name.
///
/// The empty namespace denotes the default namespace. Names are plain value
/// types; validation of what constitutes a legal local name is the concern
/// of the outer naming layer, not of this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: Arc<str>,
    local: Arc<str>,
}

impl QName {
    /// Creates a qualified name from a namespace URI and a local name.
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into().into(),
            local: local.into().into(),
        }
    }

    /// Creates a name in the default (empty) namespace.
    pub fn local(local: impl Into<String>) -> Self {
        Self::new("", local)
    }

    /// Returns the namespace URI of this name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the local part of this name.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Returns true if this name lives in the default namespace.
    pub fn is_default_namespace(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

impl From<&str> for QName {
    fn from(local: &str) -> Self {
        QName::local(local)
    }
}

// Manual Serialize/Deserialize implementations for the Arc<str> halves
impl Serialize for QName {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("QName", 2)?;
        s.serialize_field("namespace", &*self.namespace)?;
        s.serialize_field("local", &*self.local)?;
        s.end()
    }
}

impl<'de> Deserialize<'de> for QName {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            namespace: String,
            local: String,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(QName::new(raw.namespace, raw.local))
    }
}
