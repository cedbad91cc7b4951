use std::{
    cmp::{max, min},
    ops::Range,
};

/// A byte range in the source text a syntax node was parsed from.
/// Trees built without source positions use [`Span::empty`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create an empty span that highlights nothing.
    pub const fn empty() -> Self {
        Self {
            start: 0,
            length: 0,
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub const fn end(&self) -> usize {
        self.start + self.length
    }

    /// Returns the smallest span covering both `self` and `other`.
    /// For instance, given the two operands of an equality test:
    /// ```text
    /// where user_id = attending_user_id
    ///       ^^^^^^^   ^^^^^^^^^^^^^^^^^
    ///       lhs       rhs
    /// ```
    /// `lhs.to(rhs)` spans `user_id = attending_user_id`.
    /// Empty spans are ignored.
    pub fn to(self, other: Span) -> Span {
        if other.is_empty() {
            self
        } else if self.is_empty() {
            other
        } else {
            let start = min(self.start, other.start);
            let end = max(self.end(), other.end());
            Span::new(start, end - start)
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end()
    }
}
