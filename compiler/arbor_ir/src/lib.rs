//! Arbor IR - Mutable Intermediate Representation Tree
//!
//! This crate contains the tree the Arbor middle-end passes operate on:
//! - Spans for source offsets
//! - Opaque type tags and declaration descriptors
//! - Node kinds (backing-field access, if-then-else, blocks, error calls)
//! - The slot protocol that keeps parent/child links consistent
//! - Visitor dispatch over every node kind
//!
//! # Design Philosophy
//!
//! - **Arena Everything**: nodes live in an [`IrTree`] and are addressed by
//!   [`NodeId`]; a parent link is an index, never an owning pointer.
//! - **One Owner**: a node sits in at most one slot of one parent. Installing
//!   a node that already has a parent is rejected, never silently moved.
//! - **Total Traversal**: every node kind has a visitor handler, including
//!   empty blocks and unresolved calls.

/// Compile-time assertion that a type has a specific size.
///
/// Used to prevent accidental size regressions in frequently-allocated types.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

mod copy;
mod dump;
mod error;
mod ids;
mod node;
mod protocol;
mod slot;
mod span;
pub mod stack;
mod tree;
mod verify;
pub mod visitor;

pub use copy::deep_copy;
pub use dump::dump;
pub use error::{IrError, IrResult};
pub use ids::{DescriptorId, NodeId, TypeTag};
pub use node::{ChildList, ConstValue, FieldRef, NodeKind, Origin};
pub use slot::{Location, Slot};
pub use span::{Span, SpanError};
pub use tree::{IrTree, Node};
pub use verify::{verify, Violation};
pub use visitor::IrVisitor;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=arbor_ir=trace` to see every attach and detach.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
