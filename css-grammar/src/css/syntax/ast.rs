//! Syntax tree of a grammar string
//!
//! `Display` renders a tree back to canonical grammar text: single spaces around
//! combinators, `[ ... ]` for bracketed groups, and the shortest multiplier spelling.
//! Parsing the rendering gives back an identical tree.

use logos::Logos;
use serde::Serialize;
use std::fmt;

pub use super::tokens::Bounds;
use super::tokens::Token;

/// How the children of a group combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Combinator {
    /// Space separated, all in order
    Juxtaposition,
    /// `|`
    ExactlyOne,
    /// `||`
    OneOrMore,
    /// `&&`
    AllAnyOrder,
}

impl Combinator {
    /// Separator used when rendering the children of a group
    pub fn separator(self) -> &'static str {
        match self {
            Combinator::Juxtaposition => " ",
            Combinator::ExactlyOne => " | ",
            Combinator::OneOrMore => " || ",
            Combinator::AllAnyOrder => " && ",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Combinator::Juxtaposition => "juxtaposition",
            Combinator::ExactlyOne => "exactly-one",
            Combinator::OneOrMore => "one-or-more",
            Combinator::AllAnyOrder => "all-any-order",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SyntaxNode {
    /// Literal identifier or punctuation, quotes removed
    Keyword { text: String },
    /// `<name>` or `<name range>`. Property references keep their quotes: `'grid-area'`
    TypeReference {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        range: Option<String>,
    },
    Group {
        children: Vec<SyntaxNode>,
        combinator: Combinator,
        /// Written with `[ ... ]`
        bracketed: bool,
        /// Followed by `!`
        required: bool,
    },
    Multiplier {
        node: Box<SyntaxNode>,
        bounds: Bounds,
        /// `#`: occurrences are separated by commas
        comma_separated: bool,
    },
}

impl SyntaxNode {
    pub fn keyword(text: impl Into<String>) -> Self {
        SyntaxNode::Keyword { text: text.into() }
    }

    /// Build a type reference from the text between the angle brackets
    pub fn type_reference(inner: &str) -> Self {
        let inner = inner.trim();
        match inner.split_once(char::is_whitespace) {
            Some((name, range)) => SyntaxNode::TypeReference {
                name: name.to_string(),
                range: Some(range.trim().to_string()),
            },
            None => SyntaxNode::TypeReference {
                name: inner.to_string(),
                range: None,
            },
        }
    }

    /// Combine operands of one precedence level. A single operand is returned as is.
    pub fn group(mut children: Vec<SyntaxNode>, combinator: Combinator) -> Self {
        if children.len() == 1 {
            return children.remove(0);
        }
        SyntaxNode::Group {
            children,
            combinator,
            bracketed: false,
            required: false,
        }
    }

    /// Wrap the content of `[ ... ]`
    pub fn bracket(inner: SyntaxNode, required: bool) -> Self {
        match inner {
            SyntaxNode::Group {
                children,
                combinator,
                bracketed: false,
                ..
            } => SyntaxNode::Group {
                children,
                combinator,
                bracketed: true,
                required,
            },
            other => SyntaxNode::Group {
                children: vec![other],
                combinator: Combinator::Juxtaposition,
                bracketed: true,
                required,
            },
        }
    }

    pub fn multiply(node: SyntaxNode, bounds: Bounds, comma_separated: bool) -> Self {
        SyntaxNode::Multiplier {
            node: Box::new(node),
            bounds,
            comma_separated,
        }
    }

    /// Visit this node and all its descendants, parents before children
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SyntaxNode)) {
        visit(self);
        match self {
            SyntaxNode::Group { children, .. } => {
                for child in children {
                    child.walk(visit);
                }
            }
            SyntaxNode::Multiplier { node, .. } => node.walk(visit),
            SyntaxNode::Keyword { .. } | SyntaxNode::TypeReference { .. } => {}
        }
    }
}

/// A keyword can be written bare when lexing it gives back exactly that keyword
fn is_bare_keyword(text: &str) -> bool {
    let mut lexer = Token::lexer(text);
    matches!(lexer.next(), Some(Ok(Token::Keyword(ref lexed))) if lexed == text)
        && lexer.next().is_none()
}

fn bounds_suffix(bounds: Bounds) -> String {
    match bounds.max {
        Some(max) if max == bounds.min => format!("{{{}}}", max),
        Some(max) => format!("{{{},{}}}", bounds.min, max),
        None => format!("{{{},}}", bounds.min),
    }
}

/// Shortest spelling of a multiplier: `?`, `*`, `+`, `#`, `{m,n}` or `#{m,n}`
pub fn multiplier_suffix(bounds: Bounds, comma_separated: bool) -> String {
    match (comma_separated, bounds) {
        (true, Bounds::ONE_OR_MORE) => "#".to_string(),
        (true, bounds) => format!("#{}", bounds_suffix(bounds)),
        (false, Bounds::OPTIONAL) => "?".to_string(),
        (false, Bounds::ZERO_OR_MORE) => "*".to_string(),
        (false, Bounds::ONE_OR_MORE) => "+".to_string(),
        (false, bounds) => bounds_suffix(bounds),
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxNode::Keyword { text } if is_bare_keyword(text) => write!(f, "{}", text),
            SyntaxNode::Keyword { text } => write!(f, "'{}'", text),
            SyntaxNode::TypeReference { name, range: None } => write!(f, "<{}>", name),
            SyntaxNode::TypeReference {
                name,
                range: Some(range),
            } => write!(f, "<{} {}>", name, range),
            SyntaxNode::Group {
                children,
                combinator,
                bracketed,
                required,
            } => {
                if *bracketed {
                    write!(f, "[ ")?;
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", combinator.separator())?;
                    }
                    write!(f, "{}", child)?;
                }
                if *bracketed {
                    write!(f, " ]")?;
                }
                if *required {
                    write!(f, "!")?;
                }
                Ok(())
            }
            SyntaxNode::Multiplier {
                node,
                bounds,
                comma_separated,
            } => {
                write!(f, "{}{}", node, multiplier_suffix(*bounds, *comma_separated))
            }
        }
    }
}
