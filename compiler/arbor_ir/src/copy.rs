//! Subtree duplication.
//!
//! Installing a node that already has a parent is rejected, so a pass that
//! needs the same expression in two places copies it first.

use smallvec::SmallVec;
use tracing::trace;

use crate::stack::ensure_sufficient_stack;
use crate::{IrTree, Location, NodeId, Slot};

/// Clone the subtree rooted at `node` into fresh nodes of the same tree.
///
/// The copy is detached and shares no nodes with the source. Spans, type
/// tags, field references, origins and descriptions carry over unchanged.
#[tracing::instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
pub fn deep_copy(tree: &mut IrTree, node: NodeId) -> NodeId {
    copy_node(tree, node)
}

fn copy_node(tree: &mut IrTree, node: NodeId) -> NodeId {
    ensure_sufficient_stack(|| {
        let source = tree.node(node);
        let (span, ty) = (source.span(), source.ty());
        let mut kind = source.kind().clone();

        for &slot in kind.fixed_slots() {
            if let Some(stored) = kind.fixed_slot_mut(slot) {
                if let Some(child) = *stored {
                    *stored = Some(copy_node(tree, child));
                }
            }
        }
        if let Some(list) = kind.list_mut() {
            for item in list.iter_mut() {
                *item = copy_node(tree, *item);
            }
        }

        let copy = tree.alloc(span, ty, kind);
        let children: SmallVec<[(Slot, NodeId); 4]> = tree.kind(copy).children().collect();
        for (slot, child) in children {
            tree.node_mut(child).location = Some(Location::new(copy, slot));
        }
        trace!(source = %node, %copy, "copy");
        copy
    })
}
