//! Defines a [`Span`], a byte range into a template source.
//!
//! Spans are always in the coordinates of the whole source, never of the
//! line that is currently being lexed.

use std::ops::{Index, Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Inclusive start offset.
    pub m: usize,
    /// Exclusive end offset.
    pub n: usize,
}

impl Span {
    pub fn new(m: usize, n: usize) -> Self {
        debug_assert!(m <= n);
        Self { m, n }
    }
}

impl Index<Span> for str {
    type Output = str;

    fn index(&self, span: Span) -> &Self::Output {
        &self[span.m..span.n]
    }
}

impl From<Range<usize>> for Span {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}
