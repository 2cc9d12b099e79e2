//! Parsing of real value definition grammars
//!
//! The grammars below are taken from mdn-data. Those written the canonical way
//! must render back to themselves; the others must normalize.

use css_grammar::css::syntax::{parse, to_treeviz_str, Combinator, SyntaxErrorKind, SyntaxNode};
use css_grammar::css::typing;
use rstest::rstest;

#[rstest]
#[case("[ <length-percentage> | auto ]{1,4}")]
#[case("<'grid-row-start'> [ / <'grid-row-start'> ]?")]
#[case("rgb( <percentage>{3} [ / <alpha-value> ]? ) | rgb( <number>{3} [ / <alpha-value> ]? )")]
#[case("[ <bg-layer> , ]* <final-bg-layer>")]
#[case("normal | [ <numeric-figure-values> || <numeric-spacing-values> || ordinal || slashed-zero ]")]
#[case("<single-transition>#")]
#[case("[ <line-names>? [ <track-size> | <track-repeat> ] ]+ <line-names>?")]
#[case("<'border-width'> || <'border-style'> || <color>")]
#[case("inset? && <length>{2,4} && <color>?")]
#[case("'[' <custom-ident>* ']'")]
#[case("none | [ [ <dashed-ident> || <try-tactic> ] | <'position-area'> ]#")]
#[case("<length [0,∞]> | <percentage [0,∞]>")]
#[case("[ <family-name> | <generic-family> ]#{1,3}")]
#[case("[ auto | <length> ]!")]
#[case("<keyframe-selector># { <declaration-list> }")]
fn test_canonical_grammar_renders_to_itself(#[case] grammar: &str) {
    let tree = parse(grammar).unwrap();
    assert_eq!(tree.to_string(), grammar);
}

#[rstest]
#[case("a|b", "a | b")]
#[case("[a||b]", "[ a || b ]")]
#[case("<length>{1,}", "<length>+")]
#[case("<length>{0,1}", "<length>?")]
#[case("<length>{0,}", "<length>*")]
#[case("<length>#{1,}", "<length>#")]
#[case("<x>{2,2}", "<x>{2}")]
#[case("  <a>   <b>  ", "<a> <b>")]
#[case("<keyframe-selector># {\n  <declaration-list>\n}", "<keyframe-selector># { <declaration-list> }")]
fn test_grammar_normalizes(#[case] grammar: &str, #[case] canonical: &str) {
    assert_eq!(parse(grammar).unwrap().to_string(), canonical);
}

#[test]
fn test_mixed_precedence() {
    // a b | c && d || e  ==  [ a b ] | [ [ c && d ] || e ]
    let tree = parse("a b | c && d || e").unwrap();
    let SyntaxNode::Group {
        children,
        combinator,
        bracketed,
        ..
    } = &tree
    else {
        panic!("Expected group, got {:?}", tree);
    };
    assert_eq!(*combinator, Combinator::ExactlyOne);
    assert!(!bracketed);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].to_string(), "a b");
    assert!(matches!(
        &children[1],
        SyntaxNode::Group {
            combinator: Combinator::OneOrMore,
            ..
        }
    ));
    assert_eq!(children[1].to_string(), "c && d || e");
}

#[rstest]
#[case("", SyntaxErrorKind::EmptyInput)]
#[case("[ <length> | auto", SyntaxErrorKind::UnbalancedGroup)]
#[case("<length> ]", SyntaxErrorKind::UnbalancedGroup)]
#[case("<length> & <percentage>", SyntaxErrorKind::UnknownCombinator("&".into()))]
#[case("<length> | | <percentage>", SyntaxErrorKind::UnknownCombinator("| |".into()))]
#[case("+ <length>", SyntaxErrorKind::DanglingMultiplier("+".into()))]
#[case("<length>!", SyntaxErrorKind::DanglingMultiplier("!".into()))]
fn test_malformed_grammar(#[case] grammar: &str, #[case] expected: SyntaxErrorKind) {
    assert_eq!(parse(grammar).unwrap_err().kind, expected);
}

#[test]
fn test_error_message_carries_offset() {
    let err = parse("auto | <length> & <percentage>").unwrap_err();
    assert_eq!(err.span.start, 16);
    assert_eq!(err.to_string(), "Unknown combinator `&` at offset 16");
}

#[test]
fn test_typing_real_grammar() {
    let tree = parse("[ <bg-layer> , ]* <final-bg-layer> | <'background-color'>").unwrap();
    let names: Vec<String> = typing(&tree).into_iter().collect();
    assert_eq!(names, vec!["'background-color'", "bg-layer", "final-bg-layer"]);
}

#[test]
fn test_treeviz_of_function_notation() {
    let tree = parse("rgb( <percentage>{3} )").unwrap();
    insta::assert_snapshot!(to_treeviz_str(&tree), @r"
    ␣ juxtaposition
      ◦ rgb(
      × {3}
        ⟨⟩ percentage
      ◦ )
    ");
}

#[test]
fn test_tree_serializes_to_json() {
    let tree = parse("<length>#").unwrap();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["kind"], "multiplier");
    assert_eq!(json["comma_separated"], true);
    assert_eq!(json["node"]["kind"], "type-reference");
    assert_eq!(json["node"]["name"], "length");
}
