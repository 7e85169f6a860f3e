//! Slot protocol: the only code that changes parent/child links.
//!
//! Every mutation follows the same order: validate the slot against the
//! owner's shape, validate that the incoming node is detached and is not the
//! owner itself, then detach the old occupant, store the new one and attach
//! it. Validation happens before anything is touched, so a rejected call
//! leaves the tree exactly as it was.
//!
//! Policy for incoming nodes that already have a parent: reject with
//! `AlreadyAttached`, in every setter. Nothing is moved implicitly.
//!
//! Every install is O(1). The one cycle these checks cannot see without
//! walking the parent chain is a detached root installed beneath one of its
//! own descendants; a pass that may do that asks
//! [`IrTree::is_ancestor`] first, and [`verify`](crate::verify) reports it as
//! `ParentCycle`.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{IrError, IrResult, IrTree, Location, NodeId, NodeKind, Slot};

impl IrTree {
    // Reads

    /// Child stored under `slot`, or `None` if the slot is empty, not part of
    /// the owner's shape, or out of range.
    #[track_caller]
    pub fn child(&self, owner: NodeId, slot: Slot) -> Option<NodeId> {
        self.kind(owner).child(slot)
    }

    /// Receiver of a backing-field access or error call.
    pub fn receiver(&self, node: NodeId) -> IrResult<Option<NodeId>> {
        self.optional_slot(node, Slot::Receiver)
    }

    pub fn condition(&self, node: NodeId) -> IrResult<NodeId> {
        self.mandatory_slot(node, Slot::Condition)
    }

    pub fn then_branch(&self, node: NodeId) -> IrResult<NodeId> {
        self.mandatory_slot(node, Slot::Then)
    }

    pub fn else_branch(&self, node: NodeId) -> IrResult<Option<NodeId>> {
        self.optional_slot(node, Slot::Else)
    }

    /// Value assigned by a backing-field store.
    pub fn value(&self, node: NodeId) -> IrResult<NodeId> {
        self.mandatory_slot(node, Slot::Value)
    }

    pub fn statements(&self, block: NodeId) -> IrResult<&[NodeId]> {
        match self.kind(block) {
            NodeKind::BlockBody { statements } => Ok(statements.as_slice()),
            _ => Err(reject(IrError::NoSuchSlot {
                node: block,
                slot: Slot::Index(0),
            })),
        }
    }

    pub fn arguments(&self, call: NodeId) -> IrResult<&[NodeId]> {
        match self.kind(call) {
            NodeKind::ErrorCall { arguments, .. } => Ok(arguments.as_slice()),
            _ => Err(reject(IrError::NoSuchSlot {
                node: call,
                slot: Slot::Index(0),
            })),
        }
    }

    /// Diagnostic text of an error call; `None` for other kinds.
    pub fn description(&self, call: NodeId) -> Option<&str> {
        match self.kind(call) {
            NodeKind::ErrorCall { description, .. } => Some(&**description),
            _ => None,
        }
    }

    // `when` view of an if-then-else: exactly one branch.

    pub fn branches_count(&self, node: NodeId) -> IrResult<usize> {
        self.check_fixed_slot(node, Slot::Condition)?;
        Ok(1)
    }

    pub fn nth_condition(&self, node: NodeId, n: usize) -> IrResult<Option<NodeId>> {
        self.check_fixed_slot(node, Slot::Condition)?;
        if n == 0 {
            self.condition(node).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn nth_result(&self, node: NodeId, n: usize) -> IrResult<Option<NodeId>> {
        self.check_fixed_slot(node, Slot::Then)?;
        if n == 0 {
            self.then_branch(node).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Whether `ancestor` is `node` or lies on its parent chain.
    ///
    /// Walks the chain, so this costs O(depth). Installing `child` under
    /// `owner` creates a cycle exactly when `is_ancestor(child, owner)`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn check_fixed_slot(&self, node: NodeId, slot: Slot) -> IrResult<()> {
        if self.kind(node).fixed_slots().contains(&slot) {
            Ok(())
        } else {
            Err(reject(IrError::NoSuchSlot { node, slot }))
        }
    }

    fn optional_slot(&self, node: NodeId, slot: Slot) -> IrResult<Option<NodeId>> {
        self.check_fixed_slot(node, slot)?;
        Ok(self.kind(node).child(slot))
    }

    fn mandatory_slot(&self, node: NodeId, slot: Slot) -> IrResult<NodeId> {
        self.optional_slot(node, slot)?
            .ok_or_else(|| reject(IrError::UninitializedSlot { node, slot }))
    }

    // Mutation

    /// Install `new_child` at `owner.slot`, returning the previous occupant
    /// (now detached).
    ///
    /// List slots must be in range; the list length is unchanged.
    pub fn replace_child(
        &mut self,
        owner: NodeId,
        slot: Slot,
        new_child: NodeId,
    ) -> IrResult<Option<NodeId>> {
        if !self.kind(owner).has_slot(slot) {
            return Err(reject(IrError::NoSuchSlot { node: owner, slot }));
        }
        self.check_installable(owner, new_child)?;

        let old = match slot.as_index() {
            Some(index) => self
                .node_mut(owner)
                .kind
                .list_mut()
                .and_then(|list| list.get_mut(index))
                .map(|item| std::mem::replace(item, new_child)),
            None => self
                .node_mut(owner)
                .kind
                .fixed_slot_mut(slot)
                .and_then(|stored| stored.replace(new_child)),
        };
        if let Some(old) = old {
            self.unlink(old)?;
        }
        self.attach(new_child, owner, slot)?;
        Ok(old)
    }

    /// Append a statement to a block body, returning the slot it now
    /// occupies.
    pub fn add_statement(&mut self, block: NodeId, statement: NodeId) -> IrResult<Slot> {
        self.append(block, statement, |kind| {
            matches!(kind, NodeKind::BlockBody { .. })
        })
    }

    /// Append an argument to an error call, returning the slot it now
    /// occupies.
    pub fn add_argument(&mut self, call: NodeId, argument: NodeId) -> IrResult<Slot> {
        self.append(call, argument, |kind| {
            matches!(kind, NodeKind::ErrorCall { .. })
        })
    }

    fn append(
        &mut self,
        owner: NodeId,
        child: NodeId,
        accepts: fn(&NodeKind) -> bool,
    ) -> IrResult<Slot> {
        let kind = self.kind(owner);
        let slot = Slot::at(kind.list().len());
        if !accepts(kind) {
            return Err(reject(IrError::NoSuchSlot { node: owner, slot }));
        }
        self.check_installable(owner, child)?;
        if let Some(list) = self.node_mut(owner).kind.list_mut() {
            list.push(child);
        }
        self.attach(child, owner, slot)?;
        Ok(slot)
    }

    /// Set or clear the receiver, returning the previous one.
    pub fn set_receiver(
        &mut self,
        node: NodeId,
        receiver: Option<NodeId>,
    ) -> IrResult<Option<NodeId>> {
        self.set_fixed(node, Slot::Receiver, receiver)
    }

    pub fn set_condition(&mut self, node: NodeId, condition: NodeId) -> IrResult<Option<NodeId>> {
        self.set_fixed(node, Slot::Condition, Some(condition))
    }

    pub fn set_then_branch(&mut self, node: NodeId, branch: NodeId) -> IrResult<Option<NodeId>> {
        self.set_fixed(node, Slot::Then, Some(branch))
    }

    pub fn set_else_branch(
        &mut self,
        node: NodeId,
        branch: Option<NodeId>,
    ) -> IrResult<Option<NodeId>> {
        self.set_fixed(node, Slot::Else, branch)
    }

    pub fn set_value(&mut self, node: NodeId, value: NodeId) -> IrResult<Option<NodeId>> {
        self.set_fixed(node, Slot::Value, Some(value))
    }

    fn set_fixed(
        &mut self,
        owner: NodeId,
        slot: Slot,
        child: Option<NodeId>,
    ) -> IrResult<Option<NodeId>> {
        self.check_fixed_slot(owner, slot)?;
        match child {
            Some(child) => self.replace_child(owner, slot, child),
            None => match self.child(owner, slot) {
                Some(old) => {
                    self.detach(old)?;
                    Ok(Some(old))
                }
                None => Ok(None),
            },
        }
    }

    /// Remove `node` from its parent, returning where it was.
    ///
    /// An optional slot becomes empty, a mandatory slot becomes
    /// uninitialized, and a list closes the gap: later items move down one
    /// index so the list stays dense.
    pub fn detach(&mut self, node: NodeId) -> IrResult<Location> {
        let Some(location) = self.location(node) else {
            return Err(reject(IrError::InvariantViolation {
                node,
                reason: "detach of a node that is already detached",
            }));
        };
        let Location { parent, slot } = location;

        match slot.as_index() {
            Some(index) => {
                let shifted: SmallVec<[NodeId; 8]> = match self.node_mut(parent).kind.list_mut() {
                    Some(list) if list.get(index) == Some(&node) => {
                        list.remove(index);
                        list[index..].iter().copied().collect()
                    }
                    _ => return Err(corrupt_location(node, location)),
                };
                for (offset, item) in shifted.into_iter().enumerate() {
                    let slot = Slot::at(index + offset);
                    trace!(node = %item, parent = %parent, %slot, "renumber");
                    self.node_mut(item).location = Some(Location::new(parent, slot));
                }
            }
            None => match self.node_mut(parent).kind.fixed_slot_mut(slot) {
                Some(stored) if *stored == Some(node) => *stored = None,
                _ => return Err(corrupt_location(node, location)),
            },
        }

        self.unlink(node)
    }

    /// Detach every child of `owner` at once and empty its storage.
    pub(crate) fn release_children(&mut self, owner: NodeId) {
        let children: SmallVec<[NodeId; 4]> =
            self.kind(owner).children().map(|(_, child)| child).collect();
        for child in children {
            trace!(node = %child, parent = %owner, "release");
            self.node_mut(child).location = None;
        }
        let kind = &mut self.node_mut(owner).kind;
        for &slot in kind.fixed_slots() {
            if let Some(stored) = kind.fixed_slot_mut(slot) {
                *stored = None;
            }
        }
        if let Some(list) = kind.list_mut() {
            list.clear();
        }
    }

    // Attach / detach primitives

    /// `child` must be detached and must not be `owner`. Constant time; see
    /// the module docs for the descendant case.
    fn check_installable(&self, owner: NodeId, child: NodeId) -> IrResult<()> {
        if let Some(Location { parent, slot }) = self.location(child) {
            return Err(reject(IrError::AlreadyAttached {
                node: child,
                parent,
                slot,
            }));
        }
        if owner == child {
            return Err(reject(IrError::InvariantViolation {
                node: child,
                reason: "attach would make the node its own parent",
            }));
        }
        Ok(())
    }

    fn attach(&mut self, child: NodeId, owner: NodeId, slot: Slot) -> IrResult<()> {
        let node = self.node_mut(child);
        if let Some(Location { parent, slot }) = node.location {
            return Err(reject(IrError::AlreadyAttached {
                node: child,
                parent,
                slot,
            }));
        }
        node.location = Some(Location::new(owner, slot));
        trace!(node = %child, parent = %owner, %slot, "attach");
        Ok(())
    }

    fn unlink(&mut self, node: NodeId) -> IrResult<Location> {
        match self.node_mut(node).location.take() {
            Some(location) => {
                trace!(%node, parent = %location.parent, slot = %location.slot, "detach");
                Ok(location)
            }
            None => Err(reject(IrError::InvariantViolation {
                node,
                reason: "detach of a node that is already detached",
            })),
        }
    }
}

fn corrupt_location(node: NodeId, location: Location) -> IrError {
    debug!(%node, %location, "parent does not hold node at its recorded slot");
    reject(IrError::InvariantViolation {
        node,
        reason: "parent does not hold the node at its recorded slot",
    })
}

pub(crate) fn reject(err: IrError) -> IrError {
    debug!(error = %err, "slot protocol violation");
    err
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
