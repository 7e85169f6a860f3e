//! Node indices and the opaque handles the tree threads through.
//!
//! - `NodeId(u32)` addresses a node in its [`IrTree`](crate::IrTree) arena
//! - `TypeTag(u32)` is the type checker's handle for an expression's type
//! - `DescriptorId(u32)` is the resolver's handle for a declaration
//!
//! The tree compares these for equality and prints them, nothing more.

use std::fmt;

/// Index into a tree's node arena.
///
/// Stable for the life of the tree: arena entries are never freed or reused,
/// so a detached node keeps its ID and can be installed again later.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Get the index into the arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque type of an expression, assigned by the type checker.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct TypeTag(u32);

impl TypeTag {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeTag(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Opaque identity of a referenced declaration (property, class).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct DescriptorId(u32);

impl DescriptorId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        DescriptorId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DescriptorId({})", self.0)
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::{DescriptorId, NodeId, TypeTag};
    crate::static_assert_size!(NodeId, 4);
    crate::static_assert_size!(Option<NodeId>, 8);
    crate::static_assert_size!(TypeTag, 4);
    crate::static_assert_size!(DescriptorId, 4);
}
