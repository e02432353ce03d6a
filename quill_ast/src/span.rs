//! Source coordinates.

use std::fmt;

/// A line/column coordinate in the source.
///
/// Lines are 1-indexed, columns 0-indexed. Every syntax node carries one so
/// that diagnostics and scope bookkeeping can point back at the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (0-indexed).
    pub column: u32,
}

impl Span {
    /// Create a new span.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
