//! Node kinds and their slot shapes.
//!
//! Each kind declares statically which fixed slots it has and whether it owns
//! a child list. The tree consults the shape on every slot operation, so a
//! slot that is not part of a node's shape is rejected with `NoSuchSlot`
//! rather than silently ignored.

use std::fmt;

use smallvec::SmallVec;

use crate::{DescriptorId, NodeId, Slot};

/// Inline storage for a node's child list.
///
/// Most calls pass at most two arguments, so two fit without a heap
/// allocation.
pub type ChildList = SmallVec<[NodeId; 2]>;

/// Surface construct that produced a node.
///
/// Threaded through for later passes and diagnostics; the tree never acts on
/// it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Origin {
    If,
    When,
    AndAnd,
    OrOr,
    Elvis,
    SafeCall,
    GetProperty,
    SetProperty,
}

impl Origin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Origin::If => "IF",
            Origin::When => "WHEN",
            Origin::AndAnd => "ANDAND",
            Origin::OrOr => "OROR",
            Origin::Elvis => "ELVIS",
            Origin::SafeCall => "SAFE_CALL",
            Origin::GetProperty => "GET_PROPERTY",
            Origin::SetProperty => "SET_PROPERTY",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal value of a constant leaf.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(Box<str>),
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => f.write_str("null"),
            ConstValue::Bool(value) => write!(f, "{value}"),
            ConstValue::Int(value) => write!(f, "{value}"),
            ConstValue::Str(value) => write!(f, "{value:?}"),
        }
    }
}

/// Reference to a property's backing field.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldRef {
    /// The property whose backing field is accessed.
    pub descriptor: DescriptorId,
    /// Class named by an explicit `super<T>` qualifier, if any.
    pub super_qualifier: Option<DescriptorId>,
    pub origin: Option<Origin>,
}

impl FieldRef {
    pub const fn new(descriptor: DescriptorId) -> Self {
        FieldRef {
            descriptor,
            super_qualifier: None,
            origin: None,
        }
    }

    #[must_use]
    pub const fn with_super_qualifier(mut self, class: DescriptorId) -> Self {
        self.super_qualifier = Some(class);
        self
    }

    #[must_use]
    pub const fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// What a node is, together with the children it owns.
///
/// Child slots are plain `NodeId`s; an empty optional slot or an unset
/// mandatory slot is `None`. The tree hands out `&NodeKind` only, so child
/// links can change solely through the slot protocol on
/// [`IrTree`](crate::IrTree).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NodeKind {
    /// Literal leaf.
    Const(ConstValue),
    /// Read of a property's backing field. No receiver means static access.
    GetBackingField {
        field: FieldRef,
        receiver: Option<NodeId>,
    },
    /// Store into a property's backing field.
    SetBackingField {
        field: FieldRef,
        receiver: Option<NodeId>,
        value: Option<NodeId>,
    },
    /// Statement body of a function or initializer.
    BlockBody { statements: ChildList },
    /// Block with no statements.
    EmptyBlock { origin: Option<Origin> },
    /// Call the resolver could not bind.
    ErrorCall {
        description: Box<str>,
        receiver: Option<NodeId>,
        arguments: ChildList,
    },
    /// Single-branch `when`: `if (condition) then_branch else else_branch`.
    IfThenElse {
        condition: Option<NodeId>,
        then_branch: Option<NodeId>,
        else_branch: Option<NodeId>,
        origin: Option<Origin>,
    },
}

impl NodeKind {
    /// Uppercase kind name used by the tree dump.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeKind::Const(_) => "CONST",
            NodeKind::GetBackingField { .. } => "GET_BACKING_FIELD",
            NodeKind::SetBackingField { .. } => "SET_BACKING_FIELD",
            NodeKind::BlockBody { .. } => "BLOCK_BODY",
            NodeKind::EmptyBlock { .. } => "EMPTY_BLOCK",
            NodeKind::ErrorCall { .. } => "ERROR_CALL",
            NodeKind::IfThenElse { .. } => "IF_THEN_ELSE",
        }
    }

    /// Block bodies are statements; every other kind is an expression and
    /// carries a type tag.
    pub const fn is_expression(&self) -> bool {
        !matches!(self, NodeKind::BlockBody { .. })
    }

    /// Fixed slots of this kind, in traversal order.
    pub const fn fixed_slots(&self) -> &'static [Slot] {
        match self {
            NodeKind::GetBackingField { .. } => &[Slot::Receiver],
            NodeKind::SetBackingField { .. } => &[Slot::Receiver, Slot::Value],
            NodeKind::ErrorCall { .. } => &[Slot::Receiver],
            NodeKind::IfThenElse { .. } => &[Slot::Condition, Slot::Then, Slot::Else],
            NodeKind::Const(_) | NodeKind::BlockBody { .. } | NodeKind::EmptyBlock { .. } => &[],
        }
    }

    /// Whether this kind owns a growable child list.
    pub const fn has_list(&self) -> bool {
        matches!(
            self,
            NodeKind::BlockBody { .. } | NodeKind::ErrorCall { .. }
        )
    }

    /// Current child list; empty for kinds without one.
    pub fn list(&self) -> &[NodeId] {
        match self {
            NodeKind::BlockBody { statements } => statements.as_slice(),
            NodeKind::ErrorCall { arguments, .. } => arguments.as_slice(),
            _ => &[],
        }
    }

    /// Whether `slot` is part of this kind's shape given its current list
    /// length.
    pub fn has_slot(&self, slot: Slot) -> bool {
        match slot.as_index() {
            Some(index) => index < self.list().len(),
            None => self.fixed_slots().contains(&slot),
        }
    }

    /// Child stored under `slot`, or `None` if the slot is empty or not part
    /// of this kind's shape.
    pub fn child(&self, slot: Slot) -> Option<NodeId> {
        match slot.as_index() {
            Some(index) => self.list().get(index).copied(),
            None => self.fixed_slot(slot).flatten(),
        }
    }

    /// Immediate children with their slots, fixed slots first, then the
    /// list in index order.
    pub fn children(&self) -> impl Iterator<Item = (Slot, NodeId)> + '_ {
        let fixed = self
            .fixed_slots()
            .iter()
            .filter_map(move |&slot| self.child(slot).map(|child| (slot, child)));
        let list = self
            .list()
            .iter()
            .enumerate()
            .map(|(index, &child)| (Slot::at(index), child));
        fixed.chain(list)
    }

    /// Mandatory fixed slots that have not been set yet.
    pub fn uninitialized_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.fixed_slots()
            .iter()
            .copied()
            .filter(move |&slot| slot.is_mandatory() && self.child(slot).is_none())
    }

    /// Storage of a fixed slot: `None` if the slot is not in this shape,
    /// `Some(None)` if it is empty.
    fn fixed_slot(&self, slot: Slot) -> Option<Option<NodeId>> {
        match (self, slot) {
            (
                NodeKind::GetBackingField { receiver, .. }
                | NodeKind::SetBackingField { receiver, .. }
                | NodeKind::ErrorCall { receiver, .. },
                Slot::Receiver,
            ) => Some(*receiver),
            (NodeKind::SetBackingField { value, .. }, Slot::Value) => Some(*value),
            (NodeKind::IfThenElse { condition, .. }, Slot::Condition) => Some(*condition),
            (NodeKind::IfThenElse { then_branch, .. }, Slot::Then) => Some(*then_branch),
            (NodeKind::IfThenElse { else_branch, .. }, Slot::Else) => Some(*else_branch),
            _ => None,
        }
    }

    pub(crate) fn fixed_slot_mut(&mut self, slot: Slot) -> Option<&mut Option<NodeId>> {
        match (self, slot) {
            (
                NodeKind::GetBackingField { receiver, .. }
                | NodeKind::SetBackingField { receiver, .. }
                | NodeKind::ErrorCall { receiver, .. },
                Slot::Receiver,
            ) => Some(receiver),
            (NodeKind::SetBackingField { value, .. }, Slot::Value) => Some(value),
            (NodeKind::IfThenElse { condition, .. }, Slot::Condition) => Some(condition),
            (NodeKind::IfThenElse { then_branch, .. }, Slot::Then) => Some(then_branch),
            (NodeKind::IfThenElse { else_branch, .. }, Slot::Else) => Some(else_branch),
            _ => None,
        }
    }

    pub(crate) fn list_mut(&mut self) -> Option<&mut ChildList> {
        match self {
            NodeKind::BlockBody { statements } => Some(statements),
            NodeKind::ErrorCall { arguments, .. } => Some(arguments),
            _ => None,
        }
    }
}
