//! Source location tracking

use std::fmt;

/// A position in the source code (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    /// Line number, starting at 1
    pub line: usize,
    /// Column number, starting at 1
    pub col: usize,
}

impl Span {
    /// Create a new span
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Create a dummy span (for synthesized nodes and tests)
    pub fn dummy() -> Self {
        Self { line: 0, col: 0 }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} col {}", self.line, self.col)
    }
}
