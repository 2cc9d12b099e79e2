//! Error types for grammar parsing

use std::fmt;
use std::ops::Range;

/// What went wrong while parsing a grammar string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Nothing but whitespace
    EmptyInput,
    /// A `]` without its `[`, or a `[` never closed
    UnbalancedGroup,
    /// A combinator that is not `|`, `||` or `&&` (e.g. `&`, `|||`)
    UnknownCombinator(String),
    /// A multiplier with nothing to repeat, or `!` outside a bracketed group
    DanglingMultiplier(String),
    /// Text no token matches
    InvalidToken(String),
    /// A token the grammar does not allow at this position
    UnexpectedToken(String),
    /// The grammar ended in the middle of an expression
    UnexpectedEnd,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxErrorKind::EmptyInput => write!(f, "Empty grammar"),
            SyntaxErrorKind::UnbalancedGroup => write!(f, "Unbalanced group"),
            SyntaxErrorKind::UnknownCombinator(text) => write!(f, "Unknown combinator `{}`", text),
            SyntaxErrorKind::DanglingMultiplier(text) => {
                write!(f, "Multiplier `{}` has nothing to apply to", text)
            }
            SyntaxErrorKind::InvalidToken(text) => write!(f, "Invalid token `{}`", text),
            SyntaxErrorKind::UnexpectedToken(text) => write!(f, "Unexpected `{}`", text),
            SyntaxErrorKind::UnexpectedEnd => write!(f, "Unexpected end of grammar"),
        }
    }
}

/// A grammar string that could not be parsed, with the byte range at fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Range<usize>,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.span.start)
    }
}

impl std::error::Error for SyntaxError {}
