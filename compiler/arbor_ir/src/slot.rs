//! Slots: where a child sits inside its parent.

use std::fmt;

use crate::NodeId;

/// Position of a child inside its parent.
///
/// Fixed labels name single-child positions; `Index` is a dense position in
/// a node's child list (block statements, call arguments).
///
/// The derived ordering is the traversal order: fixed labels in declaration
/// order, then list positions by index.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Slot {
    Receiver,
    Condition,
    Then,
    Else,
    Value,
    Index(u32),
}

impl Slot {
    /// Stable integer code: negative for fixed labels, the index itself for
    /// list positions.
    pub const fn code(self) -> i64 {
        match self {
            Slot::Receiver => -1,
            Slot::Condition => -2,
            Slot::Then => -3,
            Slot::Else => -4,
            Slot::Value => -5,
            Slot::Index(index) => index as i64,
        }
    }

    /// List position for a `usize` index.
    ///
    /// # Panics
    /// Panics if `index` exceeds `u32::MAX`. Child lists never grow that far.
    #[track_caller]
    pub fn at(index: usize) -> Slot {
        match u32::try_from(index) {
            Ok(index) => Slot::Index(index),
            Err(_) => panic!("child list index {index} exceeds u32::MAX"),
        }
    }

    /// Whether a node with this slot in its shape must fill it before it is
    /// read. Only the if-then-else condition and branch and the assigned
    /// value of a field store are mandatory.
    pub const fn is_mandatory(self) -> bool {
        matches!(self, Slot::Condition | Slot::Then | Slot::Value)
    }

    /// List index, if this is a list position.
    #[inline]
    pub const fn as_index(self) -> Option<usize> {
        match self {
            Slot::Index(index) => Some(index as usize),
            _ => None,
        }
    }

    /// Uppercase label used by the tree dump.
    pub const fn label(self) -> &'static str {
        match self {
            Slot::Receiver => "RECEIVER",
            Slot::Condition => "CONDITION",
            Slot::Then => "THEN",
            Slot::Else => "ELSE",
            Slot::Value => "VALUE",
            Slot::Index(_) => "INDEX",
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Index(index) => write!(f, "Index({index})"),
            fixed => f.write_str(fixed.label()),
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Index(index) => write!(f, "[{index}]"),
            fixed => f.write_str(fixed.label()),
        }
    }
}

/// Where an attached node lives: its parent and the slot it occupies.
///
/// A node stores `Option<Location>`, so "has a parent" and "has a slot" can
/// never disagree.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Location {
    pub parent: NodeId,
    pub slot: Slot,
}

impl Location {
    #[inline]
    pub const fn new(parent: NodeId, slot: Slot) -> Self {
        Location { parent, slot }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.parent, self.slot)
    }
}
