//! Data type classification
//!
//! Collects the names of every type reference in a syntax tree. No lookups are
//! made here; resolving the names is the job of [data_types](crate::css::data_types).

use crate::css::data_types::TypeSet;
use crate::css::syntax::SyntaxNode;

/// Every type reference used anywhere in `tree`, each name once
pub fn typing(tree: &SyntaxNode) -> TypeSet {
    let mut types = TypeSet::new();
    tree.walk(&mut |node| {
        if let SyntaxNode::TypeReference { name, .. } = node {
            types.insert(name.clone());
        }
    });
    types
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::syntax::parse;

    fn names(source: &str) -> Vec<String> {
        typing(&parse(source).unwrap()).into_iter().collect()
    }

    #[test]
    fn test_keywords_only() {
        assert!(names("auto | none").is_empty());
    }

    #[test]
    fn test_nested_references() {
        assert_eq!(
            names("[ <length-percentage> | auto ]{1,2} && [ <color> || <length>#? ]!"),
            vec!["color", "length", "length-percentage"]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(names("<length> <length> | <length>+"), vec!["length"]);
    }

    #[test]
    fn test_range_annotation_is_ignored() {
        assert_eq!(names("<length [0,∞]> | <length>"), vec!["length"]);
    }

    #[test]
    fn test_property_reference_keeps_quotes() {
        assert_eq!(
            names("<'grid-row-start'> [ / <'grid-row-start'> ]?"),
            vec!["'grid-row-start'"]
        );
    }
}
