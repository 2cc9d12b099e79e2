//! Grammar strings and their syntax trees
//!
//! A grammar string is a CSS value definition syntax expression, e.g.
//! `<length> | <percentage>` or `[ <line-style> || <color> ]#`.
//!
//! Parsing happens in three steps:
//!     1. [tokens] turns the text into a flat `(Token, Range)` stream with logos.
//!     2. [parser] checks the stream for structural problems (brackets, stray
//!        multipliers, unknown combinators) and reports them with byte spans.
//!     3. The chumsky grammar in [parser] builds the [SyntaxNode] tree.
//!
//! Precedence, from tightest to loosest: multipliers, juxtaposition, `&&`, `||`, `|`.

pub mod ast;
pub mod error;
pub mod parser;
pub mod tokens;
pub mod treeviz;

pub use ast::{Bounds, Combinator, SyntaxNode};
pub use error::{SyntaxError, SyntaxErrorKind};
pub use parser::parse;
pub use tokens::{tokenize, Token};
pub use treeviz::to_treeviz_str;
