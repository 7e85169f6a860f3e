//! Stack growth for deep trees.
//!
//! Visitor traversal recurses once per tree level (`accept` calls a handler,
//! the handler calls `accept_children`, which calls `accept` again). Long
//! `else if` chains and generated code can nest tens of thousands of levels,
//! so every dispatch goes through [`ensure_sufficient_stack`].
//!
//! - **Native targets**: `stacker` grows the stack on demand.
//! - **WASM targets**: plain call; WASM manages its own stack.

/// Grow the stack when less than this remains (100KB).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 100 * 1024;

/// Size of each newly allocated stack segment (1MB).
#[cfg(not(target_arch = "wasm32"))]
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if it is close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
