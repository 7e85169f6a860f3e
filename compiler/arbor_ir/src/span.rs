//! Source offset spans.
//!
//! The source-position subsystem hands the tree a `(start, end)` byte offset
//! pair per node. The tree stores it and never interprets it further.

use std::fmt;

/// Error when creating a span from an offset range that cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanError {
    /// Start offset exceeds `u32::MAX`.
    #[error("span start {0} (0x{0:X}) exceeds u32::MAX")]
    StartTooLarge(usize),
    /// End offset exceeds `u32::MAX`.
    #[error("span end {0} (0x{0:X}) exceeds u32::MAX")]
    EndTooLarge(usize),
    /// End offset lies before the start offset.
    #[error("span end {end} lies before start {start}")]
    Inverted { start: usize, end: usize },
}

/// Byte offset span of a node.
///
/// Layout: 8 bytes total
/// - start: u32 - byte offset from file start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span for synthesized nodes that have no source text.
    pub const SYNTHETIC: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Try to create a span from a byte range.
    ///
    /// Returns an error if either bound exceeds `u32::MAX` or the range is
    /// inverted.
    pub fn try_from_range(range: std::ops::Range<usize>) -> Result<Self, SpanError> {
        if range.end < range.start {
            return Err(SpanError::Inverted {
                start: range.start,
                end: range.end,
            });
        }
        let start =
            u32::try_from(range.start).map_err(|_| SpanError::StartTooLarge(range.start))?;
        let end = u32::try_from(range.end).map_err(|_| SpanError::EndTooLarge(range.end))?;
        Ok(Span { start, end })
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if another span is fully contained within this span.
    #[inline]
    pub fn contains_span(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Merge two spans to create one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(target_pointer_width = "64")]
mod size_asserts {
    use super::Span;
    crate::static_assert_size!(Span, 8);
}
