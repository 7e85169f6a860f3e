//! IR Visitor Pattern
//!
//! Double dispatch over the arena: the caller holds only a [`NodeId`], and
//! [`IrTree::accept`] routes it to the handler for the node's kind.
//!
//! # Design
//!
//! Handlers form a small hierarchy. Each default implementation forwards to
//! the next more general handler, ending at the required `visit_element`:
//!
//! ```text
//! visit_get_backing_field ─┐
//! visit_set_backing_field ─┴─ visit_backing_field ─┐
//! visit_empty_block ────────── visit_block ────────┤
//! visit_const ─────────────────────────────────────┤
//! visit_error_call ────────────────────────────────┼─ visit_expression ─┐
//! visit_when ──────────────────────────────────────┘                    │
//! visit_block_body ─────────────────────────────────────────────────────┴─ visit_element
//! ```
//!
//! A visitor overrides only the handlers it cares about. Traversal does not
//! recurse on its own: a handler that wants the subtree calls
//! [`IrTree::accept_children`], which visits the immediate children in slot
//! order.
//!
//! # Example
//!
//! ```text
//! struct CountErrorCalls(usize);
//!
//! impl IrVisitor<(), ()> for CountErrorCalls {
//!     fn visit_element(&mut self, tree: &IrTree, node: NodeId, (): ()) {
//!         tree.accept_children(node, self, ());
//!     }
//!
//!     fn visit_error_call(&mut self, tree: &IrTree, node: NodeId, (): ()) {
//!         self.0 += 1;
//!         tree.accept_children(node, self, ());
//!     }
//! }
//! ```

use tracing::debug;

use crate::stack::ensure_sufficient_stack;
use crate::{IrTree, NodeId, NodeKind};

/// Visitor over IR nodes, returning `R` and receiving a context `D`.
///
/// The tree is borrowed immutably for the whole visit; a pass that rewrites
/// the tree collects its edits and applies them after traversal.
pub trait IrVisitor<R, D> {
    /// Fallback for every node kind.
    fn visit_element(&mut self, tree: &IrTree, node: NodeId, data: D) -> R;

    /// Any node that carries a type tag.
    fn visit_expression(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_element(tree, node, data)
    }

    fn visit_const(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_expression(tree, node, data)
    }

    /// Backing-field reads and stores.
    fn visit_backing_field(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_expression(tree, node, data)
    }

    fn visit_get_backing_field(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_backing_field(tree, node, data)
    }

    fn visit_set_backing_field(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_backing_field(tree, node, data)
    }

    /// Statement body. Not an expression.
    fn visit_block_body(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_element(tree, node, data)
    }

    /// Block expressions.
    fn visit_block(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_expression(tree, node, data)
    }

    fn visit_empty_block(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_block(tree, node, data)
    }

    fn visit_error_call(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_expression(tree, node, data)
    }

    /// If-then-else, the single-branch `when`.
    fn visit_when(&mut self, tree: &IrTree, node: NodeId, data: D) -> R {
        self.visit_expression(tree, node, data)
    }
}

impl IrTree {
    /// Dispatch `node` to the visitor handler for its kind.
    pub fn accept<R, D, V>(&self, node: NodeId, visitor: &mut V, data: D) -> R
    where
        V: IrVisitor<R, D> + ?Sized,
    {
        ensure_sufficient_stack(|| match self.kind(node) {
            NodeKind::Const(_) => visitor.visit_const(self, node, data),
            NodeKind::GetBackingField { .. } => visitor.visit_get_backing_field(self, node, data),
            NodeKind::SetBackingField { .. } => visitor.visit_set_backing_field(self, node, data),
            NodeKind::BlockBody { .. } => visitor.visit_block_body(self, node, data),
            NodeKind::EmptyBlock { .. } => visitor.visit_empty_block(self, node, data),
            NodeKind::ErrorCall { .. } => visitor.visit_error_call(self, node, data),
            NodeKind::IfThenElse { .. } => visitor.visit_when(self, node, data),
        })
    }

    /// Visit the immediate children of `node` (not `node` itself) in slot
    /// order: fixed slots in declared order, then the child list by index.
    ///
    /// Leaves such as empty blocks and constants invoke no callbacks.
    ///
    /// A mandatory slot that is still unset (an if-then-else built with
    /// `if_then_else_uninit`) is skipped with a `debug!` event, so the
    /// visitor sees only the children that exist. Walkers that must not see
    /// a partial node check [`NodeKind::uninitialized_slots`] first.
    pub fn accept_children<D, V>(&self, node: NodeId, visitor: &mut V, data: D)
    where
        D: Clone,
        V: IrVisitor<(), D> + ?Sized,
    {
        self.note_uninitialized(node);
        for (_, child) in self.kind(node).children() {
            self.accept(child, visitor, data.clone());
        }
    }

    /// [`accept_children`](Self::accept_children) for fallible visitors:
    /// stops at the first child whose visit fails and returns that error.
    pub fn try_accept_children<E, D, V>(&self, node: NodeId, visitor: &mut V, data: D) -> Result<(), E>
    where
        D: Clone,
        V: IrVisitor<Result<(), E>, D> + ?Sized,
    {
        self.note_uninitialized(node);
        for (_, child) in self.kind(node).children() {
            self.accept(child, visitor, data.clone())?;
        }
        Ok(())
    }

    fn note_uninitialized(&self, node: NodeId) {
        for slot in self.kind(node).uninitialized_slots() {
            debug!(%node, %slot, "accept_children skips uninitialized slot");
        }
    }
}
