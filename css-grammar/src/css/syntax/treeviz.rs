//! Treeviz formatter for syntax trees
//!
//! One line per node, two spaces of indentation per level of nesting:
//! <indentation><icon><space><label>
//!
//! Example for `[ <length> | auto ]{1,2}`:
//!
//!   × {1,2}
//!     | exactly-one [ ]
//!       ⟨⟩ length
//!       ◦ auto
//!
//! Icons
//!     Keyword: ◦
//!     TypeReference: ⟨⟩
//!     Multiplier: ×
//!     Group, by combinator:
//!         Juxtaposition: ␣
//!         ExactlyOne: |
//!         OneOrMore: ‖
//!         AllAnyOrder: &

use super::ast::{multiplier_suffix, Combinator, SyntaxNode};

fn group_icon(combinator: Combinator) -> &'static str {
    match combinator {
        Combinator::Juxtaposition => "␣",
        Combinator::ExactlyOne => "|",
        Combinator::OneOrMore => "‖",
        Combinator::AllAnyOrder => "&",
    }
}

fn label(node: &SyntaxNode) -> String {
    match node {
        SyntaxNode::Keyword { text } => format!("◦ {}", text),
        SyntaxNode::TypeReference { name, range: None } => format!("⟨⟩ {}", name),
        SyntaxNode::TypeReference {
            name,
            range: Some(range),
        } => format!("⟨⟩ {} {}", name, range),
        SyntaxNode::Group {
            combinator,
            bracketed,
            required,
            ..
        } => {
            let mut label = format!("{} {}", group_icon(*combinator), combinator.name());
            if *bracketed {
                label.push_str(" [ ]");
            }
            if *required {
                label.push('!');
            }
            label
        }
        SyntaxNode::Multiplier {
            bounds,
            comma_separated,
            ..
        } => format!("× {}", multiplier_suffix(*bounds, *comma_separated)),
    }
}

fn render(node: &SyntaxNode, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{}", "  ".repeat(depth), label(node)));
    match node {
        SyntaxNode::Group { children, .. } => {
            for child in children {
                render(child, depth + 1, lines);
            }
        }
        SyntaxNode::Multiplier { node, .. } => render(node, depth + 1, lines),
        SyntaxNode::Keyword { .. } | SyntaxNode::TypeReference { .. } => {}
    }
}

/// Render a syntax tree as treeviz, one node per line
pub fn to_treeviz_str(node: &SyntaxNode) -> String {
    let mut lines = Vec::new();
    render(node, 0, &mut lines);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::syntax::parse;

    #[test]
    fn test_treeviz_alternatives() {
        let tree = parse("<length> | <percentage>").unwrap();
        insta::assert_snapshot!(to_treeviz_str(&tree), @r"
        | exactly-one
          ⟨⟩ length
          ⟨⟩ percentage
        ");
    }

    #[test]
    fn test_treeviz_multiplier() {
        let tree = parse("[ <length> | auto ]{1,2}").unwrap();
        insta::assert_snapshot!(to_treeviz_str(&tree), @r"
        × {1,2}
          | exactly-one [ ]
            ⟨⟩ length
            ◦ auto
        ");
    }
}
