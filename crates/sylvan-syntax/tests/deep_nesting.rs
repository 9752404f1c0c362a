//! Property tests for pathological inputs: deep nesting and arbitrary bytes.
//!
//! Every walk in the crate is iterative, so depth must never matter.

use proptest::prelude::*;
use sylvan_languages::{LanguageId, language_service};
use sylvan_syntax::{SearchLimits, SyntaxTree, TraversalEngine};

fn nested_json(depth: usize) -> String {
    format!("{}1{}", "[".repeat(depth), "]".repeat(depth))
}

fn parse(language: LanguageId, source: &str) -> SyntaxTree {
    SyntaxTree::parse(&language_service(), language, source).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn deep_arrays_walk_without_overflow(depth in 500usize..4000) {
        let tree = parse(LanguageId::Json, &nested_json(depth));
        let engine = TraversalEngine::new();

        let walked = engine.traverse(&tree, tree.root(), false).unwrap().count();
        prop_assert_eq!(walked, tree.node_count());

        let numbers = engine.find_nodes_by_type(&tree, tree.root(), "number").unwrap();
        prop_assert_eq!(numbers.len(), 1);

        let chain = engine.get_ancestor_chain(&tree, numbers[0]).unwrap();
        prop_assert_eq!(chain[0], tree.root());
        prop_assert_eq!(*chain.last().unwrap(), numbers[0]);
        prop_assert_eq!(chain.len(), engine.node_depth(&tree, numbers[0]).unwrap() + 1);
    }

    #[test]
    fn depth_limit_bounds_search(depth in 50usize..400, limit in 0usize..50) {
        let tree = parse(LanguageId::Json, &nested_json(depth));
        let engine = TraversalEngine::new();
        let found = engine
            .find_nodes(&tree, tree.root(), |_| true, SearchLimits::unbounded().max_depth(limit))
            .unwrap();
        for handle in found {
            prop_assert!(engine.node_depth(&tree, handle).unwrap() <= limit);
        }
    }

    #[test]
    fn arbitrary_text_always_yields_a_tree(source in ".{0,200}") {
        let tree = parse(LanguageId::Python, &source);
        let engine = TraversalEngine::new();
        let walked = engine.traverse(&tree, tree.root(), true).unwrap().count();
        prop_assert_eq!(walked, tree.node_count());
        prop_assert_eq!(tree.root_node().byte_range().end <= source.len(), true);
    }
}
