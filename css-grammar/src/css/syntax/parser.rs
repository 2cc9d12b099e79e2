//! Parser for grammar strings using chumsky
//!
//! The chumsky grammar only ever sees a token stream that already passed
//! [check_structure], so the error kinds callers care about (unbalanced groups,
//! unknown combinators, dangling multipliers) come with precise spans. Whatever
//! chumsky still rejects is reported as an unexpected token or end of input.

use chumsky::prelude::*;
use std::ops::Range;

use super::ast::{Bounds, Combinator, SyntaxNode};
use super::error::{SyntaxError, SyntaxErrorKind};
use super::tokens::{tokenize, Token};

/// Type alias for token with span
type TokenSpan = (Token, Range<usize>);

/// Type alias for parser error
type ParserError = Simple<TokenSpan>;

/// Parse a grammar string into its syntax tree
pub fn parse(source: &str) -> Result<SyntaxNode, SyntaxError> {
    let tokens = tokenize(source)?;
    check_structure(source, &tokens)?;
    grammar()
        .parse(tokens)
        .map_err(|errors| unexpected(source, errors))
}

/// Reject token streams chumsky would only describe vaguely
fn check_structure(source: &str, tokens: &[TokenSpan]) -> Result<(), SyntaxError> {
    if tokens.is_empty() {
        return Err(SyntaxError::new(
            SyntaxErrorKind::EmptyInput,
            0..source.len(),
        ));
    }

    let mut open_groups: Vec<Range<usize>> = Vec::new();
    let mut previous: Option<&TokenSpan> = None;

    for current in tokens {
        let (token, span) = current;
        match token {
            Token::OpenBracket => open_groups.push(span.clone()),
            Token::CloseBracket => {
                if open_groups.pop().is_none() {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::UnbalancedGroup,
                        span.clone(),
                    ));
                }
            }
            Token::Ampersand => {
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnknownCombinator(source[span.clone()].to_string()),
                    span.clone(),
                ));
            }
            token if token.is_combinator() => {
                if let Some((previous_token, previous_span)) = previous {
                    if previous_token.is_combinator() {
                        let span = previous_span.start..span.end;
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnknownCombinator(source[span.clone()].to_string()),
                            span,
                        ));
                    }
                }
            }
            Token::Bang => {
                if !matches!(previous, Some((Token::CloseBracket, _))) {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::DanglingMultiplier("!".to_string()),
                        span.clone(),
                    ));
                }
            }
            token if token.is_multiplier() => {
                if !previous.is_some_and(|(previous_token, _)| previous_token.ends_operand()) {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::DanglingMultiplier(source[span.clone()].to_string()),
                        span.clone(),
                    ));
                }
            }
            _ => {}
        }
        previous = Some(current);
    }

    match open_groups.pop() {
        Some(span) => Err(SyntaxError::new(SyntaxErrorKind::UnbalancedGroup, span)),
        None => Ok(()),
    }
}

/// Map chumsky's errors to the first unexpected token
fn unexpected(source: &str, errors: Vec<ParserError>) -> SyntaxError {
    let found = errors
        .into_iter()
        .next()
        .and_then(|error| error.found().cloned());
    match found {
        Some((_, span)) => SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken(source[span.clone()].to_string()),
            span,
        ),
        None => SyntaxError::new(
            SyntaxErrorKind::UnexpectedEnd,
            source.len()..source.len(),
        ),
    }
}

/// Helper: match a specific token type, ignoring the span
fn token(kind: Token) -> impl Parser<TokenSpan, (), Error = ParserError> + Clone {
    filter(move |(tok, _): &TokenSpan| tok == &kind).ignored()
}

/// A keyword or a type reference
fn operand() -> impl Parser<TokenSpan, SyntaxNode, Error = ParserError> + Clone {
    filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Keyword(text) => Ok(SyntaxNode::keyword(text)),
        Token::TypeReference(inner) => Ok(SyntaxNode::type_reference(&inner)),
        other => Err(ParserError::expected_input_found(
            span,
            None,
            Some((other, range)),
        )),
    })
}

/// A multiplier suffix: `?`, `*`, `+`, `{m,n}`, `#` or `#{m,n}`
fn multiplier() -> impl Parser<TokenSpan, (Bounds, bool), Error = ParserError> + Clone {
    let bounded = filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Question => Ok(Bounds::OPTIONAL),
        Token::Asterisk => Ok(Bounds::ZERO_OR_MORE),
        Token::Plus => Ok(Bounds::ONE_OR_MORE),
        Token::Range(bounds) => Ok(bounds),
        other => Err(ParserError::expected_input_found(
            span,
            None,
            Some((other, range)),
        )),
    });

    let range = filter_map(|span, (tok, range): TokenSpan| match tok {
        Token::Range(bounds) => Ok(bounds),
        other => Err(ParserError::expected_input_found(
            span,
            None,
            Some((other, range)),
        )),
    });

    let comma_separated = token(Token::Hash)
        .ignore_then(range.or_not())
        .map(|bounds| (bounds.unwrap_or(Bounds::ONE_OR_MORE), true));

    comma_separated.or(bounded.map(|bounds| (bounds, false)))
}

/// The full grammar, from multipliers up to `|`
fn grammar() -> impl Parser<TokenSpan, SyntaxNode, Error = ParserError> {
    recursive(|expression| {
        let bracketed = token(Token::OpenBracket)
            .ignore_then(expression)
            .then_ignore(token(Token::CloseBracket))
            .then(token(Token::Bang).or_not())
            .map(|(inner, bang)| SyntaxNode::bracket(inner, bang.is_some()));

        let term = operand()
            .or(bracketed)
            .then(multiplier().repeated())
            .foldl(|node, (bounds, comma_separated)| {
                SyntaxNode::multiply(node, bounds, comma_separated)
            });

        let juxtaposed = term
            .repeated()
            .at_least(1)
            .map(|nodes| SyntaxNode::group(nodes, Combinator::Juxtaposition));

        let all_any_order = juxtaposed
            .separated_by(token(Token::DoubleAmpersand))
            .at_least(1)
            .map(|nodes| SyntaxNode::group(nodes, Combinator::AllAnyOrder));

        let one_or_more = all_any_order
            .separated_by(token(Token::DoubleBar))
            .at_least(1)
            .map(|nodes| SyntaxNode::group(nodes, Combinator::OneOrMore));

        one_or_more
            .separated_by(token(Token::Bar))
            .at_least(1)
            .map(|nodes| SyntaxNode::group(nodes, Combinator::ExactlyOne))
    })
    .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(source: &str) -> SyntaxErrorKind {
        parse(source).expect_err("grammar to be rejected").kind
    }

    #[test]
    fn test_single_type_reference() {
        assert_eq!(
            parse("<length>").unwrap(),
            SyntaxNode::type_reference("length")
        );
    }

    #[test]
    fn test_alternatives() {
        let tree = parse("<length> | <percentage>").unwrap();
        assert_eq!(
            tree,
            SyntaxNode::Group {
                children: vec![
                    SyntaxNode::type_reference("length"),
                    SyntaxNode::type_reference("percentage"),
                ],
                combinator: Combinator::ExactlyOne,
                bracketed: false,
                required: false,
            }
        );
    }

    #[test]
    fn test_precedence() {
        // Juxtaposition binds tighter than &&, which binds tighter than ||, then |
        let tree = parse("a b && c || d | e").unwrap();
        assert_eq!(tree.to_string(), "a b && c || d | e");
        match tree {
            SyntaxNode::Group {
                children,
                combinator: Combinator::ExactlyOne,
                ..
            } => {
                assert_eq!(children.len(), 2);
                match &children[0] {
                    SyntaxNode::Group {
                        children,
                        combinator: Combinator::OneOrMore,
                        ..
                    } => match &children[0] {
                        SyntaxNode::Group {
                            children,
                            combinator: Combinator::AllAnyOrder,
                            ..
                        } => assert!(matches!(
                            children[0],
                            SyntaxNode::Group {
                                combinator: Combinator::Juxtaposition,
                                ..
                            }
                        )),
                        other => panic!("Expected && group, got {:?}", other),
                    },
                    other => panic!("Expected || group, got {:?}", other),
                }
            }
            other => panic!("Expected | group, got {:?}", other),
        }
    }

    #[test]
    fn test_multiplier_on_group() {
        let tree = parse("[ <line-style> || <color> ]#").unwrap();
        match tree {
            SyntaxNode::Multiplier {
                node,
                bounds,
                comma_separated,
            } => {
                assert_eq!(bounds, Bounds::ONE_OR_MORE);
                assert!(comma_separated);
                assert!(matches!(
                    *node,
                    SyntaxNode::Group {
                        combinator: Combinator::OneOrMore,
                        bracketed: true,
                        ..
                    }
                ));
            }
            other => panic!("Expected multiplier, got {:?}", other),
        }
    }

    #[test]
    fn test_comma_separated_range() {
        let tree = parse("<length>#{1,4}").unwrap();
        assert_eq!(
            tree,
            SyntaxNode::multiply(
                SyntaxNode::type_reference("length"),
                Bounds::new(1, Some(4)),
                true
            )
        );
    }

    #[test]
    fn test_stacked_multipliers() {
        let tree = parse("<shadow>#?").unwrap();
        assert_eq!(
            tree,
            SyntaxNode::multiply(
                SyntaxNode::multiply(
                    SyntaxNode::type_reference("shadow"),
                    Bounds::ONE_OR_MORE,
                    true
                ),
                Bounds::OPTIONAL,
                false
            )
        );
    }

    #[test]
    fn test_required_group() {
        let tree = parse("[ <integer> && <custom-ident>? ]!").unwrap();
        assert!(matches!(
            tree,
            SyntaxNode::Group {
                combinator: Combinator::AllAnyOrder,
                bracketed: true,
                required: true,
                ..
            }
        ));
    }

    #[test]
    fn test_function_notation() {
        let tree = parse("rgb( <percentage>{3} [ / <alpha-value> ]? )").unwrap();
        assert_eq!(
            tree.to_string(),
            "rgb( <percentage>{3} [ / <alpha-value> ]? )"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kind(""), SyntaxErrorKind::EmptyInput);
        assert_eq!(kind("   "), SyntaxErrorKind::EmptyInput);
    }

    #[test]
    fn test_unbalanced_group() {
        assert_eq!(kind("[ a | b"), SyntaxErrorKind::UnbalancedGroup);
        assert_eq!(kind("a | b ]"), SyntaxErrorKind::UnbalancedGroup);
        let err = parse("a [ b [ c ]").unwrap_err();
        assert_eq!(err.span, 2..3);
    }

    #[test]
    fn test_unknown_combinator() {
        assert_eq!(
            kind("a & b"),
            SyntaxErrorKind::UnknownCombinator("&".into())
        );
        assert_eq!(
            kind("a ||| b"),
            SyntaxErrorKind::UnknownCombinator("|||".into())
        );
        assert_eq!(
            kind("a | && b"),
            SyntaxErrorKind::UnknownCombinator("| &&".into())
        );
        // Reported as written
        let err = parse("a | | b").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnknownCombinator("| |".into()));
        assert_eq!(err.span, 2..5);
    }

    #[test]
    fn test_dangling_multiplier() {
        assert_eq!(kind("* a"), SyntaxErrorKind::DanglingMultiplier("*".into()));
        assert_eq!(
            kind("a | ? b"),
            SyntaxErrorKind::DanglingMultiplier("?".into())
        );
        assert_eq!(
            kind("[ #{1,2} a ]"),
            SyntaxErrorKind::DanglingMultiplier("#".into())
        );
        assert_eq!(kind("a!"), SyntaxErrorKind::DanglingMultiplier("!".into()));
    }

    #[test]
    fn test_missing_operand() {
        assert!(matches!(
            kind("| a"),
            SyntaxErrorKind::UnexpectedToken(_) | SyntaxErrorKind::UnexpectedEnd
        ));
        assert!(matches!(
            kind("a |"),
            SyntaxErrorKind::UnexpectedToken(_) | SyntaxErrorKind::UnexpectedEnd
        ));
        assert!(matches!(
            kind("[ ]"),
            SyntaxErrorKind::UnexpectedToken(_) | SyntaxErrorKind::UnexpectedEnd
        ));
    }
}
