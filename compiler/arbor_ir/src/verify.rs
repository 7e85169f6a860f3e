//! Whole-tree consistency check.
//!
//! The slot protocol keeps every link consistent on its own; `verify` is for
//! tests and for passes that want to assert the tree they hand on is sound.
//! It checks:
//! - every child a node stores points back at that node and slot
//! - every attached node is actually held by the parent it names
//! - no node is stored in two places
//! - no parent chain loops
//! - expressions carry a type tag and block bodies do not

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::{IrTree, Location, NodeId};

/// One broken invariant found by [`verify`].
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Violation {
    /// `node` names `location`, but that slot holds something else.
    #[error("{node} claims {location} but its parent does not hold it")]
    StaleLocation { node: NodeId, location: Location },

    /// A parent stores `child` at `expected`, yet `child` has no parent.
    #[error("{child} is stored at {expected} but is detached")]
    MissingBackLink { child: NodeId, expected: Location },

    /// A parent stores `child` at `expected`, yet `child` names `found`.
    #[error("{child} is stored at {expected} but points to {found}")]
    WrongBackLink {
        child: NodeId,
        expected: Location,
        found: Location,
    },

    #[error("{child} is stored at both {first} and {second}")]
    SharedChild {
        child: NodeId,
        first: Location,
        second: Location,
    },

    #[error("{node} is its own ancestor")]
    ParentCycle { node: NodeId },

    /// Expression without a type tag, or a block body with one.
    #[error("{node} has a type tag inconsistent with its kind")]
    TypeMismatch { node: NodeId },
}

/// Check every arena entry. Returns an empty vec for a healthy tree.
#[tracing::instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
pub fn verify(tree: &IrTree) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut owners: FxHashMap<NodeId, Location> = FxHashMap::default();

    for (id, node) in tree.iter() {
        if node.kind().is_expression() != node.ty().is_some() {
            violations.push(Violation::TypeMismatch { node: id });
        }

        for (slot, child) in node.kind().children() {
            let here = Location::new(id, slot);
            if let Some(&first) = owners.get(&child) {
                violations.push(Violation::SharedChild {
                    child,
                    first,
                    second: here,
                });
            } else {
                owners.insert(child, here);
            }
            match tree.location(child) {
                Some(found) if found == here => {}
                Some(found) => violations.push(Violation::WrongBackLink {
                    child,
                    expected: here,
                    found,
                }),
                None => violations.push(Violation::MissingBackLink {
                    child,
                    expected: here,
                }),
            }
        }

        if let Some(location) = node.location() {
            if tree.kind(location.parent).child(location.slot) != Some(id) {
                violations.push(Violation::StaleLocation { node: id, location });
            }
        }
    }

    check_parent_chains(tree, &mut violations);

    if !violations.is_empty() {
        debug!(count = violations.len(), "IR tree failed verification");
    }
    violations
}

#[derive(Copy, Clone, Eq, PartialEq)]
enum Walk {
    Unseen,
    OnPath,
    Done,
}

/// Follow each parent chain once, reporting every node whose chain loops
/// back onto itself.
fn check_parent_chains(tree: &IrTree, violations: &mut Vec<Violation>) {
    let mut state = vec![Walk::Unseen; tree.len()];
    let mut path = Vec::new();

    for (start, _) in tree.iter() {
        let mut current = Some(start);
        while let Some(id) = current {
            match state[id.index()] {
                Walk::Done => break,
                Walk::OnPath => {
                    violations.push(Violation::ParentCycle { node: id });
                    break;
                }
                Walk::Unseen => {
                    state[id.index()] = Walk::OnPath;
                    path.push(id);
                    current = tree.parent(id);
                }
            }
        }
        for id in path.drain(..) {
            state[id.index()] = Walk::Done;
        }
    }
}
