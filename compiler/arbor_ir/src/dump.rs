//! Textual rendering of a subtree.
//!
//! One node per line, indented two spaces per level:
//!
//! ```text
//! BLOCK_BODY 0..20
//!   [0]: IF_THEN_ELSE 0..12 t4 origin=IF
//!     CONDITION: CONST 4..8 t4 false
//!     THEN: EMPTY_BLOCK 10..12 t4
//! ```
//!
//! Each line is `SLOT: KIND span type` followed by kind-specific details.
//! The root has no slot prefix. A mandatory slot that was never filled shows
//! as `<uninitialized>`.

use std::fmt::Write;

use crate::{FieldRef, IrTree, IrVisitor, NodeId, NodeKind, Origin, Slot};

/// Render the subtree rooted at `root`.
pub fn dump(tree: &IrTree, root: NodeId) -> String {
    let mut dumper = Dumper { out: String::new() };
    tree.accept(root, &mut dumper, Frame { depth: 0, slot: None });
    dumper.out
}

/// Where the node being rendered sits.
#[derive(Copy, Clone)]
struct Frame {
    depth: usize,
    slot: Option<Slot>,
}

impl Frame {
    fn child(self, slot: Slot) -> Frame {
        Frame {
            depth: self.depth + 1,
            slot: Some(slot),
        }
    }
}

struct Dumper {
    out: String,
}

impl Dumper {
    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    /// Write the node's line, then recurse into its children.
    fn line(&mut self, tree: &IrTree, node: NodeId, frame: Frame, detail: &str) {
        self.indent(frame.depth);
        if let Some(slot) = frame.slot {
            let _ = write!(self.out, "{slot}: ");
        }
        let _ = write!(self.out, "{} {}", tree.kind(node).name(), tree.span(node));
        if let Some(ty) = tree.ty(node) {
            let _ = write!(self.out, " {ty}");
        }
        if !detail.is_empty() {
            self.out.push(' ');
            self.out.push_str(detail);
        }
        self.out.push('\n');
        self.children(tree, node, frame);
    }

    fn children(&mut self, tree: &IrTree, node: NodeId, frame: Frame) {
        let kind = tree.kind(node);
        for &slot in kind.fixed_slots() {
            match kind.child(slot) {
                Some(child) => tree.accept(child, self, frame.child(slot)),
                None if slot.is_mandatory() => {
                    self.indent(frame.depth + 1);
                    let _ = writeln!(self.out, "{slot}: <uninitialized>");
                }
                None => {}
            }
        }
        for (index, &child) in kind.list().iter().enumerate() {
            tree.accept(child, self, frame.child(Slot::at(index)));
        }
    }
}

fn origin_detail(origin: Option<Origin>) -> String {
    origin.map(|origin| format!("origin={origin}")).unwrap_or_default()
}

fn field_detail(field: &FieldRef) -> String {
    let mut detail = field.descriptor.to_string();
    if let Some(class) = field.super_qualifier {
        let _ = write!(detail, " super={class}");
    }
    if let Some(origin) = field.origin {
        let _ = write!(detail, " origin={origin}");
    }
    detail
}

impl IrVisitor<(), Frame> for Dumper {
    fn visit_element(&mut self, tree: &IrTree, node: NodeId, frame: Frame) {
        self.line(tree, node, frame, "");
    }

    fn visit_const(&mut self, tree: &IrTree, node: NodeId, frame: Frame) {
        let detail = match tree.kind(node) {
            NodeKind::Const(value) => value.to_string(),
            _ => String::new(),
        };
        self.line(tree, node, frame, &detail);
    }

    fn visit_backing_field(&mut self, tree: &IrTree, node: NodeId, frame: Frame) {
        let detail = match tree.kind(node) {
            NodeKind::GetBackingField { field, .. } | NodeKind::SetBackingField { field, .. } => {
                field_detail(field)
            }
            _ => String::new(),
        };
        self.line(tree, node, frame, &detail);
    }

    fn visit_empty_block(&mut self, tree: &IrTree, node: NodeId, frame: Frame) {
        let detail = match tree.kind(node) {
            NodeKind::EmptyBlock { origin } => origin_detail(*origin),
            _ => String::new(),
        };
        self.line(tree, node, frame, &detail);
    }

    fn visit_error_call(&mut self, tree: &IrTree, node: NodeId, frame: Frame) {
        let detail = tree
            .description(node)
            .map(|description| format!("{description:?}"))
            .unwrap_or_default();
        self.line(tree, node, frame, &detail);
    }

    fn visit_when(&mut self, tree: &IrTree, node: NodeId, frame: Frame) {
        let detail = match tree.kind(node) {
            NodeKind::IfThenElse { origin, .. } => origin_detail(*origin),
            _ => String::new(),
        };
        self.line(tree, node, frame, &detail);
    }
}
