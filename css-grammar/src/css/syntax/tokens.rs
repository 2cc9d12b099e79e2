//! Token definitions for CSS value definition grammars
//!
//! The tokens are defined using the logos derive macro. Whitespace is skipped, so
//! juxtaposition is implied by two operands following each other.
use logos::{Lexer, Logos};
use serde::Serialize;
use std::ops::Range;

use super::error::{SyntaxError, SyntaxErrorKind};

/// Repetition bounds of a multiplier. `max: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Bounds {
    pub min: u32,
    pub max: Option<u32>,
}

impl Bounds {
    pub const OPTIONAL: Bounds = Bounds::new(0, Some(1));
    pub const ZERO_OR_MORE: Bounds = Bounds::new(0, None);
    pub const ONE_OR_MORE: Bounds = Bounds::new(1, None);

    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }
}

/// All possible tokens of a grammar string
#[derive(Logos, Debug, PartialEq, Eq, Hash, Clone)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Groups
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,

    // Combinators
    #[token("|")]
    Bar,
    #[token("||")]
    DoubleBar,
    #[token("&&")]
    DoubleAmpersand,
    // Never valid, kept as a token so it can be reported as an unknown combinator
    #[token("&")]
    Ampersand,

    // Multipliers
    #[token("?")]
    Question,
    #[token("*")]
    Asterisk,
    #[token("+")]
    Plus,
    #[token("#")]
    Hash,
    #[regex(r"\{ *[0-9]+ *(, *[0-9]* *)?\}", bounds)]
    Range(Bounds),
    #[token("!")]
    Bang,

    // `<length>`, `<length [0,∞]>`, `<'grid-area'>`; holds the text between the angle brackets
    #[regex(r"<[^<>\s][^<>]*>", type_reference)]
    TypeReference(String),

    // Identifiers, function openers, numbers, bare punctuation and quoted literals
    #[regex(r"(--|-)?[a-zA-Z_][a-zA-Z0-9_-]*", keyword)]
    #[regex(r"(--|-)?[a-zA-Z_][a-zA-Z0-9_-]*\(", keyword)]
    #[regex(r"[0-9]+(\.[0-9]+)?", keyword)]
    // A `{` or `}` that does not spell out a range
    #[regex(r"[,/():;=%.{}]", keyword)]
    #[regex(r"'[^']+'", quoted)]
    Keyword(String),
}

fn keyword(lex: &mut Lexer<Token>) -> String {
    lex.slice().to_string()
}

fn quoted(lex: &mut Lexer<Token>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].to_string()
}

fn type_reference(lex: &mut Lexer<Token>) -> String {
    let slice = lex.slice();
    slice[1..slice.len() - 1].to_string()
}

fn bounds(lex: &mut Lexer<Token>) -> Option<Bounds> {
    let inner = lex.slice().trim_start_matches('{').trim_end_matches('}');
    let (min, max) = match inner.split_once(',') {
        None => {
            let min = inner.trim().parse().ok()?;
            (min, Some(min))
        }
        Some((min, max)) if max.trim().is_empty() => (min.trim().parse().ok()?, None),
        Some((min, max)) => (min.trim().parse().ok()?, Some(max.trim().parse().ok()?)),
    };
    // `{3,1}` can never match anything
    if max.is_some_and(|max| max < min) {
        return None;
    }
    Some(Bounds::new(min, max))
}

impl Token {
    /// Check if this token joins two operands
    pub fn is_combinator(&self) -> bool {
        matches!(
            self,
            Token::Bar | Token::DoubleBar | Token::DoubleAmpersand | Token::Ampersand
        )
    }

    /// Check if this token repeats the operand before it (`!` excluded)
    pub fn is_multiplier(&self) -> bool {
        matches!(
            self,
            Token::Question | Token::Asterisk | Token::Plus | Token::Hash | Token::Range(_)
        )
    }

    /// Check if a multiplier may follow this token
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Keyword(_) | Token::TypeReference(_) | Token::CloseBracket | Token::Bang
        ) || self.is_multiplier()
    }
}

/// Tokenize a grammar string, keeping the byte range of every token
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, SyntaxError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::InvalidToken(lexer.slice().to_string()),
                    lexer.span(),
                ))
            }
        }
    }

    Ok(tokens)
}
