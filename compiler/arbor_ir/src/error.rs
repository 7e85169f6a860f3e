//! Slot protocol errors.
//!
//! Every variant is a contract violation by the calling pass. They are
//! returned so the pass can abort its current transformation with context,
//! never retried.

use crate::{NodeId, Slot};

/// Result alias for slot protocol operations.
pub type IrResult<T> = Result<T, IrError>;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum IrError {
    /// Attach/detach used against the protocol: detaching a detached node,
    /// or attaching a node beneath itself.
    #[error("invariant violation on {node}: {reason}")]
    InvariantViolation { node: NodeId, reason: &'static str },

    /// The slot is not part of the node's shape, or the list index is out of
    /// range.
    #[error("{node} has no slot {slot}")]
    NoSuchSlot { node: NodeId, slot: Slot },

    /// The node being installed already lives at `parent.slot`.
    #[error("{node} is already attached at {parent}.{slot}; detach or copy it first")]
    AlreadyAttached {
        node: NodeId,
        parent: NodeId,
        slot: Slot,
    },

    /// A mandatory slot was read before it was set.
    #[error("slot {slot} of {node} is not initialized")]
    UninitializedSlot { node: NodeId, slot: Slot },
}

impl IrError {
    /// The node the error is about.
    pub fn node(&self) -> NodeId {
        match self {
            IrError::InvariantViolation { node, .. }
            | IrError::NoSuchSlot { node, .. }
            | IrError::AlreadyAttached { node, .. }
            | IrError::UninitializedSlot { node, .. } => *node,
        }
    }
}
