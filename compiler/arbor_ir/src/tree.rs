//! The node arena.
//!
//! [`IrTree`] owns every node; [`NodeId`] indices address them. A node's
//! parent link is an index into the same arena, so navigation is O(1) in
//! both directions without reference cycles.
//!
//! Construction lives here. Everything that changes a parent/child link
//! lives in the slot protocol (`protocol.rs`).

use rustc_hash::FxHashSet;

use crate::node::ChildList;
use crate::protocol::reject;
use crate::{
    ConstValue, FieldRef, IrError, IrResult, Location, NodeId, NodeKind, Origin, Slot, Span,
    TypeTag,
};

/// One arena entry: a node's span, type, location and kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    pub(crate) span: Span,
    pub(crate) ty: Option<TypeTag>,
    pub(crate) location: Option<Location>,
    pub(crate) kind: NodeKind,
}

impl Node {
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Type tag; `None` only for block bodies, which are not expressions.
    #[inline]
    pub fn ty(&self) -> Option<TypeTag> {
        self.ty
    }

    #[inline]
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.location.map(|location| location.parent)
    }

    #[inline]
    pub fn slot(&self) -> Option<Slot> {
        self.location.map(|location| location.slot)
    }

    #[inline]
    pub fn is_detached(&self) -> bool {
        self.location.is_none()
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

/// Arena of IR nodes.
///
/// Nodes are created detached. Entries are never freed, so a `NodeId` stays
/// valid for the life of the tree even after its node is detached.
///
/// Passing a `NodeId` from a different tree is a bug and panics on the
/// out-of-bounds index, like any arena index.
#[derive(Clone, Debug, Default)]
pub struct IrTree {
    nodes: Vec<Node>,
}

impl IrTree {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Number of allocated nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[track_caller]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    #[track_caller]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    #[inline]
    #[track_caller]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    #[inline]
    #[track_caller]
    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    #[inline]
    #[track_caller]
    pub fn ty(&self, id: NodeId) -> Option<TypeTag> {
        self.node(id).ty
    }

    #[inline]
    #[track_caller]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    #[inline]
    #[track_caller]
    pub fn slot(&self, id: NodeId) -> Option<Slot> {
        self.node(id).slot()
    }

    #[inline]
    #[track_caller]
    pub fn location(&self, id: NodeId) -> Option<Location> {
        self.node(id).location
    }

    #[inline]
    #[track_caller]
    pub fn is_detached(&self, id: NodeId) -> bool {
        self.node(id).is_detached()
    }

    /// All nodes in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node_id(index), node))
    }

    /// Nodes with no parent: tree roots and nodes a pass has detached.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.is_detached())
            .map(|(id, _)| id)
    }

    pub(crate) fn alloc(&mut self, span: Span, ty: Option<TypeTag>, kind: NodeKind) -> NodeId {
        let id = node_id(self.nodes.len());
        self.nodes.push(Node {
            span,
            ty,
            location: None,
            kind,
        });
        id
    }

    /// Children handed to a constructor must be detached and distinct.
    ///
    /// Checked before allocation, so a rejected constructor allocates nothing
    /// and an `AlreadyAttached` error always names a live parent.
    fn check_new_children(&self, children: impl IntoIterator<Item = NodeId>) -> IrResult<()> {
        let mut seen = FxHashSet::default();
        for child in children {
            if let Some(Location { parent, slot }) = self.location(child) {
                return Err(reject(IrError::AlreadyAttached {
                    node: child,
                    parent,
                    slot,
                }));
            }
            if !seen.insert(child) {
                return Err(reject(IrError::InvariantViolation {
                    node: child,
                    reason: "the same node was passed for two child slots",
                }));
            }
        }
        Ok(())
    }

    /// Allocate a node and install `children` into its fixed slots.
    ///
    /// If any child cannot be installed, the children already installed are
    /// detached again and the error is returned.
    fn alloc_with(
        &mut self,
        span: Span,
        ty: TypeTag,
        kind: NodeKind,
        children: &[(Slot, Option<NodeId>)],
    ) -> IrResult<NodeId> {
        self.check_new_children(children.iter().filter_map(|&(_, child)| child))?;
        let id = self.alloc(span, Some(ty), kind);
        for &(slot, child) in children {
            let Some(child) = child else { continue };
            if let Err(err) = self.replace_child(id, slot, child) {
                self.release_children(id);
                return Err(err);
            }
        }
        Ok(id)
    }

    // Construction

    /// Literal leaf.
    pub fn constant(&mut self, span: Span, ty: TypeTag, value: ConstValue) -> NodeId {
        self.alloc(span, Some(ty), NodeKind::Const(value))
    }

    /// Block with no statements.
    pub fn empty_block(&mut self, span: Span, ty: TypeTag, origin: Option<Origin>) -> NodeId {
        self.alloc(span, Some(ty), NodeKind::EmptyBlock { origin })
    }

    /// Statement body with no statements yet; grow it with
    /// [`add_statement`](Self::add_statement).
    pub fn block_body(&mut self, span: Span) -> NodeId {
        self.alloc(
            span,
            None,
            NodeKind::BlockBody {
                statements: ChildList::new(),
            },
        )
    }

    /// Statement body holding `statements` in order.
    pub fn block_body_with(
        &mut self,
        span: Span,
        statements: impl IntoIterator<Item = NodeId>,
    ) -> IrResult<NodeId> {
        let statements: ChildList = statements.into_iter().collect();
        self.check_new_children(statements.iter().copied())?;
        let block = self.block_body(span);
        for statement in statements {
            if let Err(err) = self.add_statement(block, statement) {
                self.release_children(block);
                return Err(err);
            }
        }
        Ok(block)
    }

    /// Backing-field read. `receiver` is `None` for static access.
    pub fn get_backing_field(
        &mut self,
        span: Span,
        ty: TypeTag,
        field: FieldRef,
        receiver: Option<NodeId>,
    ) -> IrResult<NodeId> {
        let kind = NodeKind::GetBackingField {
            field,
            receiver: None,
        };
        self.alloc_with(span, ty, kind, &[(Slot::Receiver, receiver)])
    }

    /// Backing-field store of `value`.
    pub fn set_backing_field(
        &mut self,
        span: Span,
        ty: TypeTag,
        field: FieldRef,
        receiver: Option<NodeId>,
        value: NodeId,
    ) -> IrResult<NodeId> {
        let kind = NodeKind::SetBackingField {
            field,
            receiver: None,
            value: None,
        };
        self.alloc_with(
            span,
            ty,
            kind,
            &[(Slot::Receiver, receiver), (Slot::Value, Some(value))],
        )
    }

    /// Unresolved call with no receiver or arguments yet.
    pub fn error_call(
        &mut self,
        span: Span,
        ty: TypeTag,
        description: impl Into<Box<str>>,
    ) -> NodeId {
        let kind = NodeKind::ErrorCall {
            description: description.into(),
            receiver: None,
            arguments: ChildList::new(),
        };
        self.alloc(span, Some(ty), kind)
    }

    /// Unresolved call with an initial receiver and arguments, in order.
    pub fn error_call_with(
        &mut self,
        span: Span,
        ty: TypeTag,
        description: impl Into<Box<str>>,
        receiver: Option<NodeId>,
        arguments: impl IntoIterator<Item = NodeId>,
    ) -> IrResult<NodeId> {
        let arguments: ChildList = arguments.into_iter().collect();
        self.check_new_children(receiver.into_iter().chain(arguments.iter().copied()))?;
        let call = self.error_call(span, ty, description);
        if let Err(err) = self.fill_error_call(call, receiver, &arguments) {
            self.release_children(call);
            return Err(err);
        }
        Ok(call)
    }

    fn fill_error_call(
        &mut self,
        call: NodeId,
        receiver: Option<NodeId>,
        arguments: &[NodeId],
    ) -> IrResult<()> {
        if let Some(receiver) = receiver {
            self.replace_child(call, Slot::Receiver, receiver)?;
        }
        for &argument in arguments {
            self.add_argument(call, argument)?;
        }
        Ok(())
    }

    /// `if (condition) then_branch else else_branch`.
    pub fn if_then_else(
        &mut self,
        span: Span,
        ty: TypeTag,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
        origin: Option<Origin>,
    ) -> IrResult<NodeId> {
        let kind = NodeKind::IfThenElse {
            condition: None,
            then_branch: None,
            else_branch: None,
            origin,
        };
        self.alloc_with(
            span,
            ty,
            kind,
            &[
                (Slot::Condition, Some(condition)),
                (Slot::Then, Some(then_branch)),
                (Slot::Else, else_branch),
            ],
        )
    }

    /// If-then-else whose condition and then-branch are set later. Reading
    /// either before it is set fails with `UninitializedSlot`.
    pub fn if_then_else_uninit(&mut self, span: Span, ty: TypeTag, origin: Option<Origin>) -> NodeId {
        let kind = NodeKind::IfThenElse {
            condition: None,
            then_branch: None,
            else_branch: None,
            origin,
        };
        self.alloc(span, Some(ty), kind)
    }
}

/// `NodeId` for an arena position.
///
/// # Panics
/// Panics if the arena outgrows `u32` indices.
#[track_caller]
fn node_id(index: usize) -> NodeId {
    match u32::try_from(index) {
        Ok(index) => NodeId::new(index),
        Err(_) => panic!("IR arena exceeds u32::MAX nodes"),
    }
}
