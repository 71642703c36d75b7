//! Structured paths for hierarchical item addressing.
//!
//! A [`Path`] is an ordered sequence of [`PathSegment`]s; the root path is
//! the empty sequence. Each segment carries a [`QName`] and a 1-based
//! same-name-sibling index, where index 1 is the default and is elided when
//! the path is rendered. Paths are built either step by step through
//! [`PathBuilder`] or by joining segments onto an existing path.
//!
//! Textualization is a debug convenience only; the core always operates on
//! the structured form.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::name::QName;

/// The default same-name-sibling index. An absent index means this value.
pub const DEFAULT_INDEX: u32 = 1;

/// Error type for path composition failures.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// Same-name-sibling indexes are 1-based; 0 is never a legal index.
    #[error("invalid same-name-sibling index {index}, indexes are 1-based")]
    InvalidIndex { index: u32 },
}

/// One step of a path: a name plus a 1-based same-name-sibling index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    name: QName,
    index: u32,
}

impl PathSegment {
    /// Creates a segment with the default index.
    pub fn new(name: QName) -> Self {
        Self {
            name,
            index: DEFAULT_INDEX,
        }
    }

    /// Creates a segment with an explicit 1-based index.
    pub fn indexed(name: QName, index: u32) -> Result<Self, PathError> {
        if index < DEFAULT_INDEX {
            return Err(PathError::InvalidIndex { index });
        }
        Ok(Self { name, index })
    }

    /// Returns the name of this segment.
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Returns the 1-based index of this segment.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns true if this segment carries the default index.
    pub fn has_default_index(&self) -> bool {
        self.index == DEFAULT_INDEX
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_default_index() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}[{}]", self.name, self.index)
        }
    }
}

/// An ordered sequence of path segments. Empty means the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Returns the root path (the empty sequence).
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from a segment sequence.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Returns true if this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns the segments of this path, root first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the last segment, or `None` for the root path.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Returns the parent path, or `None` for the root path.
    pub fn parent(&self) -> Option<Path> {
        if self.is_root() {
            return None;
        }
        Some(Path {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns this path extended by one segment.
    pub fn join(&self, segment: PathSegment) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Path { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Incremental builder for [`Path`] values, used by bottom-up path
/// reconstruction.
#[derive(Debug, Default)]
pub struct PathBuilder {
    segments: Vec<PathSegment>,
}

impl PathBuilder {
    /// Creates an empty builder. Building immediately yields the root path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step with the default index.
    pub fn push(&mut self, name: QName) {
        self.segments.push(PathSegment::new(name));
    }

    /// Appends a step with an explicit 1-based index.
    pub fn push_indexed(&mut self, name: QName, index: u32) -> Result<(), PathError> {
        self.segments.push(PathSegment::indexed(name, index)?);
        Ok(())
    }

    /// Prepends a step with an explicit 1-based index. Used when a path is
    /// assembled leaf-first.
    pub fn push_front_indexed(&mut self, name: QName, index: u32) -> Result<(), PathError> {
        self.segments.insert(0, PathSegment::indexed(name, index)?);
        Ok(())
    }

    /// Consumes the builder and returns the assembled path.
    pub fn build(self) -> Path {
        Path {
            segments: self.segments,
        }
    }
}
