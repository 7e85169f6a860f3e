use pretty_assertions::assert_eq;

use std::time::{Duration, Instant};

use crate::{
    verify, ConstValue, DescriptorId, FieldRef, IrError, IrTree, Location, NodeId, Slot, Span,
    TypeTag, Violation,
};

const BOOL: TypeTag = TypeTag::from_raw(1);
const INT: TypeTag = TypeTag::from_raw(2);
const UNIT: TypeTag = TypeTag::from_raw(3);

fn int(tree: &mut IrTree, value: i64) -> NodeId {
    tree.constant(Span::new(0, 1), INT, ConstValue::Int(value))
}

fn flag(tree: &mut IrTree, value: bool) -> NodeId {
    tree.constant(Span::new(0, 4), BOOL, ConstValue::Bool(value))
}

/// Every node's location agrees with its parent's storage.
#[track_caller]
fn assert_consistent(tree: &IrTree) {
    for (id, node) in tree.iter() {
        assert_eq!(node.parent().is_some(), node.slot().is_some());
        for (slot, child) in node.kind().children() {
            assert_eq!(tree.location(child), Some(Location::new(id, slot)));
        }
        if let Some(Location { parent, slot }) = node.location() {
            assert_eq!(tree.child(parent, slot), Some(id));
        }
    }
}

// If-then-else

#[test]
fn test_if_then_else_round_trip() {
    let mut tree = IrTree::new();
    let x = flag(&mut tree, true);
    let y = int(&mut tree, 1);
    let z = int(&mut tree, 2);
    let node = tree
        .if_then_else(Span::new(0, 20), INT, x, y, Some(z), None)
        .unwrap();

    assert_eq!(tree.nth_condition(node, 0), Ok(Some(x)));
    assert_eq!(tree.nth_result(node, 0), Ok(Some(y)));
    assert_eq!(tree.else_branch(node), Ok(Some(z)));
    assert_eq!(tree.branches_count(node), Ok(1));
    assert_eq!(tree.nth_condition(node, 1), Ok(None));
    assert_eq!(tree.nth_result(node, 1), Ok(None));
    assert_eq!(tree.location(x), Some(Location::new(node, Slot::Condition)));
    assert_eq!(tree.location(y), Some(Location::new(node, Slot::Then)));
    assert_eq!(tree.location(z), Some(Location::new(node, Slot::Else)));
    assert!(tree.is_detached(node));
    assert_consistent(&tree);
}

#[test]
fn test_uninitialized_condition_read_fails() {
    let mut tree = IrTree::new();
    let node = tree.if_then_else_uninit(Span::new(0, 5), UNIT, None);
    assert_eq!(
        tree.condition(node),
        Err(IrError::UninitializedSlot {
            node,
            slot: Slot::Condition
        })
    );
    assert_eq!(
        tree.then_branch(node),
        Err(IrError::UninitializedSlot {
            node,
            slot: Slot::Then
        })
    );
    assert_eq!(tree.else_branch(node), Ok(None));
    assert!(tree.nth_condition(node, 0).is_err());

    let cond = flag(&mut tree, false);
    assert_eq!(tree.set_condition(node, cond), Ok(None));
    assert_eq!(tree.condition(node), Ok(cond));
}

#[test]
fn test_reassigning_slot_detaches_previous_occupant() {
    let mut tree = IrTree::new();
    let x = flag(&mut tree, true);
    let y = int(&mut tree, 1);
    let node = tree
        .if_then_else(Span::new(0, 9), INT, x, y, None, None)
        .unwrap();

    let y2 = int(&mut tree, 7);
    assert_eq!(tree.set_then_branch(node, y2), Ok(Some(y)));
    assert!(tree.is_detached(y));
    assert_eq!(tree.then_branch(node), Ok(y2));
    assert_eq!(tree.condition(node), Ok(x));
    assert_consistent(&tree);
}

#[test]
fn test_clearing_else_branch() {
    let mut tree = IrTree::new();
    let x = flag(&mut tree, true);
    let y = int(&mut tree, 1);
    let z = int(&mut tree, 2);
    let node = tree
        .if_then_else(Span::new(0, 9), INT, x, y, Some(z), None)
        .unwrap();

    assert_eq!(tree.set_else_branch(node, None), Ok(Some(z)));
    assert!(tree.is_detached(z));
    assert_eq!(tree.else_branch(node), Ok(None));
    assert_eq!(tree.set_else_branch(node, None), Ok(None));
}

#[test]
fn test_constructor_rejects_attached_child_without_side_effects() {
    let mut tree = IrTree::new();
    let x = flag(&mut tree, true);
    let y = int(&mut tree, 1);
    let first = tree
        .if_then_else(Span::new(0, 9), INT, x, y, None, None)
        .unwrap();

    let fresh = flag(&mut tree, false);
    let err = tree
        .if_then_else(Span::new(10, 19), INT, fresh, y, None, None)
        .unwrap_err();
    assert_eq!(
        err,
        IrError::AlreadyAttached {
            node: y,
            parent: first,
            slot: Slot::Then
        }
    );
    // Rejected before anything was allocated or linked.
    assert_eq!(tree.len(), 4);
    assert!(tree.is_detached(fresh));
    assert_eq!(tree.location(y), Some(Location::new(first, Slot::Then)));
    assert_consistent(&tree);
}

#[test]
fn test_same_node_in_two_slots_is_rejected() {
    let mut tree = IrTree::new();
    let x = flag(&mut tree, true);
    let err = tree
        .if_then_else(Span::new(0, 9), BOOL, x, x, None, None)
        .unwrap_err();
    assert!(matches!(err, IrError::InvariantViolation { node, .. } if node == x));
    assert!(tree.is_detached(x));
    assert_eq!(tree.len(), 1);

    let err = tree.block_body_with(Span::new(0, 9), [x, x]).unwrap_err();
    assert!(matches!(err, IrError::InvariantViolation { node, .. } if node == x));
    assert_eq!(tree.len(), 1);
}

// Block body

#[test]
fn test_add_statement_assigns_dense_indices() {
    let mut tree = IrTree::new();
    let block = tree.block_body(Span::new(0, 30));
    let a = int(&mut tree, 1);
    let b = int(&mut tree, 2);
    let c = int(&mut tree, 3);

    assert_eq!(tree.add_statement(block, a), Ok(Slot::Index(0)));
    assert_eq!(tree.add_statement(block, b), Ok(Slot::Index(1)));
    assert_eq!(tree.add_statement(block, c), Ok(Slot::Index(2)));
    assert_eq!(tree.statements(block), Ok(&[a, b, c][..]));
    assert_eq!(tree.child(block, Slot::Index(1)), Some(b));
    assert_eq!(tree.child(block, Slot::Index(3)), None);
    assert_eq!(tree.ty(block), None);
    assert_consistent(&tree);
}

#[test]
fn test_replace_statement_out_of_range() {
    let mut tree = IrTree::new();
    let a = int(&mut tree, 1);
    let b = int(&mut tree, 2);
    let c = int(&mut tree, 3);
    let block = tree.block_body_with(Span::new(0, 30), [a, b, c]).unwrap();
    let d = int(&mut tree, 4);

    assert_eq!(
        tree.replace_child(block, Slot::Index(5), d),
        Err(IrError::NoSuchSlot {
            node: block,
            slot: Slot::Index(5)
        })
    );
    assert!(tree.is_detached(d));
    assert_eq!(tree.statements(block).map(<[_]>::len), Ok(3));
}

#[test]
fn test_replace_statement_in_place() {
    let mut tree = IrTree::new();
    let a = int(&mut tree, 1);
    let b = int(&mut tree, 2);
    let c = int(&mut tree, 3);
    let block = tree.block_body_with(Span::new(0, 30), [a, b, c]).unwrap();
    let d = int(&mut tree, 4);

    assert_eq!(tree.replace_child(block, Slot::Index(1), d), Ok(Some(b)));
    assert_eq!(tree.statements(block), Ok(&[a, d, c][..]));
    assert!(tree.is_detached(b));
    assert_eq!(tree.location(d), Some(Location::new(block, Slot::Index(1))));
    assert_eq!(tree.location(c), Some(Location::new(block, Slot::Index(2))));
    assert_consistent(&tree);
}

#[test]
fn test_fixed_slot_on_block_is_rejected() {
    let mut tree = IrTree::new();
    let block = tree.block_body(Span::new(0, 0));
    let a = int(&mut tree, 1);
    assert!(matches!(
        tree.replace_child(block, Slot::Receiver, a),
        Err(IrError::NoSuchSlot { .. })
    ));
    assert!(matches!(
        tree.condition(block),
        Err(IrError::NoSuchSlot { .. })
    ));
}

// Empty block and leaves

#[test]
fn test_empty_block_has_no_slots() {
    let mut tree = IrTree::new();
    let empty = tree.empty_block(Span::new(0, 2), UNIT, None);
    let a = int(&mut tree, 1);
    for slot in [Slot::Index(0), Slot::Receiver, Slot::Then] {
        assert_eq!(
            tree.replace_child(empty, slot, a),
            Err(IrError::NoSuchSlot { node: empty, slot })
        );
        assert_eq!(tree.child(empty, slot), None);
    }
    assert!(tree.add_statement(empty, a).is_err());
    assert!(tree.is_detached(a));
}

// Error call

#[test]
fn test_error_call_arguments() {
    let mut tree = IrTree::new();
    let call = tree.error_call(Span::new(0, 8), UNIT, "unresolved: foo");
    let p = int(&mut tree, 1);
    let q = int(&mut tree, 2);

    assert_eq!(tree.add_argument(call, p), Ok(Slot::Index(0)));
    assert_eq!(tree.add_argument(call, q), Ok(Slot::Index(1)));
    assert_eq!(tree.child(call, Slot::Index(0)), Some(p));
    assert_eq!(tree.child(call, Slot::Index(1)), Some(q));
    assert_eq!(tree.description(call), Some("unresolved: foo"));

    let other = tree.error_call(Span::new(9, 12), UNIT, "unresolved: bar");
    assert_eq!(
        tree.add_argument(other, p),
        Err(IrError::AlreadyAttached {
            node: p,
            parent: call,
            slot: Slot::Index(0)
        })
    );
    assert_eq!(tree.arguments(other), Ok(&[][..]));
    assert_consistent(&tree);
}

#[test]
fn test_error_call_receiver_and_replace() {
    let mut tree = IrTree::new();
    let call = tree.error_call(Span::new(0, 8), UNIT, "unresolved: foo");
    let r = int(&mut tree, 0);
    let p = int(&mut tree, 1);
    tree.add_argument(call, p).unwrap();

    assert_eq!(tree.set_receiver(call, Some(r)), Ok(None));
    assert_eq!(tree.receiver(call), Ok(Some(r)));
    assert_eq!(tree.child(call, Slot::Receiver), Some(r));

    let p2 = int(&mut tree, 5);
    assert_eq!(tree.replace_child(call, Slot::Index(0), p2), Ok(Some(p)));
    assert_eq!(tree.arguments(call), Ok(&[p2][..]));
    assert_consistent(&tree);
}

// Backing fields

#[test]
fn test_backing_field_receiver_optional() {
    let mut tree = IrTree::new();
    let field = FieldRef::new(DescriptorId::from_raw(11));
    let get = tree
        .get_backing_field(Span::new(0, 4), INT, field, None)
        .unwrap();
    assert_eq!(tree.receiver(get), Ok(None));

    let receiver = int(&mut tree, 0);
    assert_eq!(tree.replace_child(get, Slot::Receiver, receiver), Ok(None));
    assert_eq!(tree.receiver(get), Ok(Some(receiver)));
    assert!(matches!(
        tree.replace_child(get, Slot::Value, receiver),
        Err(IrError::NoSuchSlot { .. })
    ));
}

#[test]
fn test_set_backing_field_value() {
    let mut tree = IrTree::new();
    let field = FieldRef::new(DescriptorId::from_raw(11));
    let value = int(&mut tree, 3);
    let set = tree
        .set_backing_field(Span::new(0, 4), UNIT, field, None, value)
        .unwrap();
    assert_eq!(tree.value(set), Ok(value));

    tree.detach(value).unwrap();
    assert_eq!(
        tree.value(set),
        Err(IrError::UninitializedSlot {
            node: set,
            slot: Slot::Value
        })
    );
}

// Detach

#[test]
fn test_double_detach_is_invariant_violation() {
    let mut tree = IrTree::new();
    let a = int(&mut tree, 1);
    let block = tree.block_body_with(Span::new(0, 2), [a]).unwrap();

    assert_eq!(
        tree.detach(a),
        Ok(Location::new(block, Slot::Index(0)))
    );
    assert!(matches!(
        tree.detach(a),
        Err(IrError::InvariantViolation { node, .. }) if node == a
    ));
    assert!(matches!(
        tree.detach(block),
        Err(IrError::InvariantViolation { .. })
    ));
}

#[test]
fn test_detach_from_list_renumbers_tail() {
    let mut tree = IrTree::new();
    let a = int(&mut tree, 1);
    let b = int(&mut tree, 2);
    let c = int(&mut tree, 3);
    let block = tree.block_body_with(Span::new(0, 30), [a, b, c]).unwrap();

    tree.detach(a).unwrap();
    assert_eq!(tree.statements(block), Ok(&[b, c][..]));
    assert_eq!(tree.slot(b), Some(Slot::Index(0)));
    assert_eq!(tree.slot(c), Some(Slot::Index(1)));
    assert_consistent(&tree);
}

#[test]
fn test_detached_node_can_be_reinstalled() {
    let mut tree = IrTree::new();
    let a = int(&mut tree, 1);
    let first = tree.block_body_with(Span::new(0, 2), [a]).unwrap();
    let second = tree.block_body(Span::new(3, 5));

    tree.detach(a).unwrap();
    assert_eq!(tree.add_statement(second, a), Ok(Slot::Index(0)));
    assert_eq!(tree.statements(first), Ok(&[][..]));
    assert_eq!(tree.parent(a), Some(second));
}

#[test]
fn test_install_under_itself_is_rejected() {
    let mut tree = IrTree::new();
    let block = tree.block_body(Span::new(0, 4));
    let when = tree.if_then_else_uninit(Span::new(0, 4), INT, None);

    assert!(matches!(
        tree.add_statement(block, block),
        Err(IrError::InvariantViolation { node, .. }) if node == block
    ));
    assert!(matches!(
        tree.set_then_branch(when, when),
        Err(IrError::InvariantViolation { node, .. }) if node == when
    ));
    assert!(tree.is_detached(block));
    assert!(tree.is_detached(when));
    assert_consistent(&tree);
}

#[test]
fn test_is_ancestor_follows_parent_chain() {
    let mut tree = IrTree::new();
    let leaf = int(&mut tree, 1);
    let inner = tree.block_body_with(Span::new(0, 2), [leaf]).unwrap();
    let outer = tree.block_body_with(Span::new(0, 4), [inner]).unwrap();
    let other = tree.block_body(Span::new(5, 6));

    assert!(tree.is_ancestor(outer, leaf));
    assert!(tree.is_ancestor(inner, inner));
    assert!(!tree.is_ancestor(leaf, outer));
    assert!(!tree.is_ancestor(other, leaf));
}

#[test]
fn test_root_under_its_descendant_is_caught_by_verify() {
    let mut tree = IrTree::new();
    let inner = tree.block_body(Span::new(0, 2));
    let outer = tree.block_body_with(Span::new(0, 4), [inner]).unwrap();

    // Callers that might do this check first.
    assert!(tree.is_ancestor(outer, inner));

    tree.add_statement(inner, outer).unwrap();
    assert!(verify(&tree)
        .iter()
        .any(|violation| matches!(violation, Violation::ParentCycle { .. })));
}

/// Time `count` condition replacements on an if-then-else nested `depth`
/// levels deep.
fn time_deep_replacements(depth: usize, count: usize) -> Duration {
    let mut tree = IrTree::new();
    let cond = flag(&mut tree, true);
    let then = int(&mut tree, 0);
    let bottom = tree
        .if_then_else(Span::new(0, 1), INT, cond, then, None, None)
        .unwrap();
    let mut current = bottom;
    for _ in 0..depth {
        let cond = flag(&mut tree, true);
        current = tree
            .if_then_else(Span::new(0, 1), INT, cond, current, None, None)
            .unwrap();
    }
    let fresh: Vec<NodeId> = (0..count).map(|_| flag(&mut tree, false)).collect();

    let start = Instant::now();
    for node in fresh {
        tree.replace_child(bottom, Slot::Condition, node).unwrap();
    }
    let elapsed = start.elapsed();
    assert_eq!(tree.location(bottom).map(|l| l.slot), Some(Slot::Then));
    elapsed
}

#[test]
fn test_replace_child_cost_does_not_grow_with_depth() {
    let shallow = time_deep_replacements(10, 20_000);
    let deep = time_deep_replacements(20_000, 20_000);

    // A parent-chain walk per install makes the deep case thousands of
    // times slower.
    assert!(
        deep < shallow * 20 + Duration::from_millis(50),
        "deep: {deep:?}, shallow: {shallow:?}"
    );
}

#[test]
fn test_detach_with_stale_list_index_keeps_siblings() {
    let mut tree = IrTree::new();
    let a = int(&mut tree, 1);
    let b = int(&mut tree, 2);
    let block = tree.block_body_with(Span::new(0, 4), [a, b]).unwrap();
    let stray = int(&mut tree, 3);
    tree.node_mut(stray).location = Some(Location::new(block, Slot::Index(0)));

    assert!(matches!(
        tree.detach(stray),
        Err(IrError::InvariantViolation { node, .. }) if node == stray
    ));
    assert_eq!(tree.statements(block), Ok(&[a, b][..]));
    assert_eq!(tree.slot(b), Some(Slot::Index(1)));
}
