//! Generic tree walking over a [`SyntaxTree`].
//!
//! Everything here is iterative with explicit stacks or parent links, so
//! pathologically deep trees cannot overflow the call stack.

use crate::{NodeHandle, NodeRef, Position, SyntaxTree, TraversalError, TreeId};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

/// Bounds for [`TraversalEngine::find_nodes`]. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchLimits {
    /// Deepest level below the search root to visit (the root is level 0).
    pub max_depth: Option<usize>,
    /// Stop after this many matches.
    pub max_nodes: Option<usize>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn max_nodes(mut self, count: usize) -> Self {
        self.max_nodes = Some(count);
        self
    }
}

/// Summary of one node, memoized by [`TraversalEngine::get_node_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub kind: &'static str,
    pub text: String,
    pub start: Position,
    pub end: Position,
    pub byte_range: Range<usize>,
    pub depth: usize,
    pub child_count: usize,
    pub named_child_count: usize,
    pub is_named: bool,
    pub is_error: bool,
    pub is_missing: bool,
    pub has_error: bool,
}

/// Lazy pre-order walk returned by [`TraversalEngine::traverse`].
///
/// Finite and single-use; call `traverse` again to restart.
pub struct Traverse<'t> {
    tree: &'t SyntaxTree,
    start: u32,
    stack: Vec<u32>,
    visited: Option<Vec<bool>>,
}

impl<'t> Iterator for Traverse<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let index = self.stack.pop()?;
            // Siblings of the start node are outside the walk.
            if index != self.start
                && let Some(next) = self.tree.next_sibling_index(index)
            {
                self.stack.push(next);
            }
            if let Some(child) = self.tree.first_child_index(index) {
                self.stack.push(child);
            }
            if let Some(visited) = &mut self.visited {
                if visited[index as usize] {
                    continue;
                }
                visited[index as usize] = true;
            }
            return self.tree.node(self.tree.handle(index)).ok();
        }
    }
}

/// Walks trees and memoizes per-node summaries.
///
/// The cache is keyed by [`NodeHandle`], which includes the tree id, so an
/// entry from one tree can never answer for another. The engine also drops
/// its cache whenever it is pointed at a different tree than the one that
/// filled it, and [`clear_cache`](Self::clear_cache) does so explicitly.
#[derive(Debug, Default)]
pub struct TraversalEngine {
    cache_tree: Option<TreeId>,
    cache: HashMap<NodeHandle, Arc<NodeInfo>>,
}

impl TraversalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-order iterator over the subtree rooted at `node`.
    ///
    /// With `visit_once`, each node is yielded at most once even if the
    /// walk would reach it twice.
    pub fn traverse<'t>(
        &self,
        tree: &'t SyntaxTree,
        node: NodeHandle,
        visit_once: bool,
    ) -> Result<Traverse<'t>, TraversalError> {
        tree.check(node)?;
        let start = node.index() as u32;
        Ok(Traverse {
            tree,
            start,
            stack: vec![start],
            visited: visit_once.then(|| vec![false; tree.node_count()]),
        })
    }

    /// Pre-order search below `root`, bounded by `limits`.
    ///
    /// Hitting either limit ends the search quietly with what was found.
    pub fn find_nodes(
        &self,
        tree: &SyntaxTree,
        root: NodeHandle,
        mut predicate: impl FnMut(NodeRef<'_>) -> bool,
        limits: SearchLimits,
    ) -> Result<Vec<NodeHandle>, TraversalError> {
        tree.check(root)?;
        let mut found = Vec::new();
        if limits.max_nodes == Some(0) {
            return Ok(found);
        }
        let mut stack = vec![(root.index() as u32, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = tree.node(tree.handle(index))?;
            if predicate(node) {
                found.push(node.handle());
                if limits.max_nodes.is_some_and(|max| found.len() >= max) {
                    break;
                }
            }
            if limits.max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            let children: Vec<u32> = node.children().map(|c| c.handle().index() as u32).collect();
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
        Ok(found)
    }

    /// All nodes of a given kind below `root`, in document order.
    pub fn find_nodes_by_type(
        &self,
        tree: &SyntaxTree,
        root: NodeHandle,
        kind: &str,
    ) -> Result<Vec<NodeHandle>, TraversalError> {
        self.find_nodes(tree, root, |n| n.kind() == kind, SearchLimits::unbounded())
    }

    /// Ancestors of `node` from the root down to and including `node`.
    pub fn get_ancestor_chain(
        &self,
        tree: &SyntaxTree,
        node: NodeHandle,
    ) -> Result<Vec<NodeHandle>, TraversalError> {
        tree.check(node)?;
        let mut chain = vec![node];
        let mut current = node.index() as u32;
        while let Some(parent) = tree.parent_index(current) {
            chain.push(tree.handle(parent));
            current = parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Nearest proper ancestor of the given kind.
    pub fn find_parent_of_type(
        &self,
        tree: &SyntaxTree,
        node: NodeHandle,
        kind: &str,
    ) -> Result<Option<NodeHandle>, TraversalError> {
        let mut current = tree.node(node)?.parent();
        while let Some(n) = current {
            if n.kind() == kind {
                return Ok(Some(n.handle()));
            }
            current = n.parent();
        }
        Ok(None)
    }

    /// Distance from the root.
    pub fn node_depth(&self, tree: &SyntaxTree, node: NodeHandle) -> Result<usize, TraversalError> {
        Ok(tree.node(node)?.depth())
    }

    /// Node kinds from the root down to `node`.
    pub fn node_path(
        &self,
        tree: &SyntaxTree,
        node: NodeHandle,
    ) -> Result<Vec<&'static str>, TraversalError> {
        self.get_ancestor_chain(tree, node)?
            .into_iter()
            .map(|h| tree.node(h).map(|n| n.kind()))
            .collect()
    }

    pub fn previous_sibling(
        &self,
        tree: &SyntaxTree,
        node: NodeHandle,
    ) -> Result<Option<NodeHandle>, TraversalError> {
        Ok(tree.node(node)?.prev_sibling().map(|n| n.handle()))
    }

    pub fn next_sibling(
        &self,
        tree: &SyntaxTree,
        node: NodeHandle,
    ) -> Result<Option<NodeHandle>, TraversalError> {
        Ok(tree.node(node)?.next_sibling().map(|n| n.handle()))
    }

    /// Deepest node that is an ancestor-or-self of both `a` and `b`.
    pub fn common_ancestor(
        &self,
        tree: &SyntaxTree,
        a: NodeHandle,
        b: NodeHandle,
    ) -> Result<NodeHandle, TraversalError> {
        let chain_a = self.get_ancestor_chain(tree, a)?;
        let chain_b = self.get_ancestor_chain(tree, b)?;
        let shared = chain_a
            .iter()
            .zip(&chain_b)
            .take_while(|(x, y)| x == y)
            .count();
        // Both chains start at the root, so at least one entry is shared.
        Ok(chain_a[shared.max(1) - 1])
    }

    /// Named nodes below `root` lying entirely within lines `start..=end`
    /// (1-based), outermost first.
    pub fn nodes_in_range(
        &self,
        tree: &SyntaxTree,
        root: NodeHandle,
        start_line: usize,
        end_line: usize,
    ) -> Result<Vec<NodeHandle>, TraversalError> {
        self.find_nodes(
            tree,
            root,
            |n| n.is_named() && n.start().line >= start_line && n.end().line <= end_line,
            SearchLimits::unbounded(),
        )
    }

    /// Whether the subtree at `node` parsed cleanly.
    pub fn verify_node(&self, tree: &SyntaxTree, node: NodeHandle) -> Result<bool, TraversalError> {
        let n = tree.node(node)?;
        Ok(!n.has_error() && !n.is_error() && !n.is_missing())
    }

    /// Summary of `node`, computed once per handle.
    pub fn get_node_info(
        &mut self,
        tree: &SyntaxTree,
        node: NodeHandle,
    ) -> Result<Arc<NodeInfo>, TraversalError> {
        let n = tree.node(node)?;
        if self.cache_tree != Some(tree.id()) {
            if !self.cache.is_empty() {
                tracing::trace!(from = ?self.cache_tree, to = %tree.id(), "node info cache reset");
            }
            self.cache.clear();
            self.cache_tree = Some(tree.id());
        }
        if let Some(info) = self.cache.get(&node) {
            return Ok(Arc::clone(info));
        }
        let info = Arc::new(NodeInfo {
            kind: n.kind(),
            text: n.text().into_owned(),
            start: n.start(),
            end: n.end(),
            byte_range: n.byte_range(),
            depth: n.depth(),
            child_count: n.child_count(),
            named_child_count: n.named_child_count(),
            is_named: n.is_named(),
            is_error: n.is_error(),
            is_missing: n.is_missing(),
            has_error: n.has_error(),
        });
        self.cache.insert(node, Arc::clone(&info));
        Ok(info)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.cache_tree = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylvan_languages::{LanguageId, language_service};

    fn parse(language: LanguageId, source: &str) -> SyntaxTree {
        SyntaxTree::parse(&language_service(), language, source).unwrap()
    }

    const SAMPLE: &str = "class A:\n    def m(self):\n        return 1\n\ndef f(x):\n    return x\n";

    #[test]
    fn test_traverse_is_preorder_and_complete() {
        let tree = parse(LanguageId::Python, SAMPLE);
        let engine = TraversalEngine::new();
        let visited: Vec<_> = engine
            .traverse(&tree, tree.root(), false)
            .unwrap()
            .map(|n| n.handle().index())
            .collect();
        assert_eq!(visited, (0..tree.node_count()).collect::<Vec<_>>());
    }

    #[test]
    fn test_traverse_subtree_excludes_siblings() {
        let tree = parse(LanguageId::Python, SAMPLE);
        let engine = TraversalEngine::new();
        let class = tree.root_node().children().next().unwrap();
        let kinds: Vec<_> = engine
            .traverse(&tree, class.handle(), true)
            .unwrap()
            .map(|n| n.kind())
            .collect();
        assert_eq!(kinds.first(), Some(&"class_definition"));
        assert!(kinds.contains(&"return_statement"));
        // `f` is a sibling of the class, not part of its subtree.
        let identifiers: Vec<_> = engine
            .traverse(&tree, class.handle(), false)
            .unwrap()
            .filter(|n| n.kind() == "identifier")
            .map(|n| n.text().into_owned())
            .collect();
        assert_eq!(identifiers, ["A", "m", "self"]);
    }

    #[test]
    fn test_traverse_is_deterministic_across_trees() {
        let engine = TraversalEngine::new();
        let a = parse(LanguageId::Python, SAMPLE);
        let b = parse(LanguageId::Python, SAMPLE);
        let kinds = |t: &SyntaxTree| -> Vec<&'static str> {
            engine.traverse(t, t.root(), false).unwrap().map(|n| n.kind()).collect()
        };
        assert_eq!(kinds(&a), kinds(&a));
        assert_eq!(kinds(&a), kinds(&b));
    }

    #[test]
    fn test_find_nodes_limits() {
        let tree = parse(LanguageId::Python, SAMPLE);
        let engine = TraversalEngine::new();
        let all = engine
            .find_nodes_by_type(&tree, tree.root(), "function_definition")
            .unwrap();
        assert_eq!(all.len(), 2);

        let first_only = engine
            .find_nodes(
                &tree,
                tree.root(),
                |n| n.kind() == "function_definition",
                SearchLimits::unbounded().max_nodes(1),
            )
            .unwrap();
        assert_eq!(first_only, all[..1]);

        // `m` sits under class_definition > block, so depth 1 only sees `f`.
        let shallow = engine
            .find_nodes(
                &tree,
                tree.root(),
                |n| n.kind() == "function_definition",
                SearchLimits::unbounded().max_depth(1),
            )
            .unwrap();
        assert_eq!(shallow, all[1..]);
    }

    #[test]
    fn test_ancestor_chain_is_root_first() {
        let tree = parse(LanguageId::Python, SAMPLE);
        let engine = TraversalEngine::new();
        let ret = engine
            .find_nodes_by_type(&tree, tree.root(), "return_statement")
            .unwrap()[0];
        let chain = engine.get_ancestor_chain(&tree, ret).unwrap();
        assert_eq!(chain.first(), Some(&tree.root()));
        assert_eq!(chain.last(), Some(&ret));
        assert_eq!(
            engine.node_path(&tree, ret).unwrap(),
            ["module", "class_definition", "block", "function_definition", "block", "return_statement"]
        );
        assert_eq!(engine.node_depth(&tree, ret).unwrap(), 5);
        let class = engine
            .find_parent_of_type(&tree, ret, "class_definition")
            .unwrap()
            .unwrap();
        assert_eq!(tree.node(class).unwrap().kind(), "class_definition");
        assert_eq!(engine.find_parent_of_type(&tree, ret, "lambda").unwrap(), None);
    }

    #[test]
    fn test_common_ancestor_and_siblings() {
        let tree = parse(LanguageId::Python, SAMPLE);
        let engine = TraversalEngine::new();
        let funcs = engine
            .find_nodes_by_type(&tree, tree.root(), "function_definition")
            .unwrap();
        assert_eq!(engine.common_ancestor(&tree, funcs[0], funcs[1]).unwrap(), tree.root());
        assert_eq!(engine.common_ancestor(&tree, funcs[0], funcs[0]).unwrap(), funcs[0]);

        let class = tree.root_node().children().next().unwrap().handle();
        assert_eq!(engine.next_sibling(&tree, class).unwrap(), Some(funcs[1]));
        assert_eq!(engine.previous_sibling(&tree, funcs[1]).unwrap(), Some(class));
        assert_eq!(engine.previous_sibling(&tree, class).unwrap(), None);
    }

    #[test]
    fn test_nodes_in_range() {
        let tree = parse(LanguageId::Python, SAMPLE);
        let engine = TraversalEngine::new();
        let in_range = engine.nodes_in_range(&tree, tree.root(), 5, 6).unwrap();
        assert_eq!(tree.node(in_range[0]).unwrap().kind(), "function_definition");
        assert!(
            in_range
                .iter()
                .all(|h| tree.node(*h).unwrap().start().line >= 5)
        );
    }

    #[test]
    fn test_node_info_cache_is_per_tree() {
        let a = parse(LanguageId::Python, "x = 1\n");
        let b = parse(LanguageId::Python, "yy = 22\n");
        let mut engine = TraversalEngine::new();

        let first = engine.get_node_info(&a, a.root()).unwrap();
        let again = engine.get_node_info(&a, a.root()).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(engine.cached_entries(), 1);

        // Same arena index in a different tree: never served from a's entry.
        let other = engine.get_node_info(&b, b.root()).unwrap();
        assert!(other.text.starts_with("yy = 22"));
        assert_eq!(engine.cached_entries(), 1);

        engine.clear_cache();
        assert_eq!(engine.cached_entries(), 0);
    }

    #[test]
    fn test_foreign_handle_fails_fast() {
        let a = parse(LanguageId::Python, "x = 1\n");
        let b = parse(LanguageId::Python, "x = 1\n");
        let engine = TraversalEngine::new();
        assert!(matches!(
            engine.get_ancestor_chain(&b, a.root()),
            Err(TraversalError::ForeignNode { .. })
        ));
        assert!(engine.traverse(&b, a.root(), false).is_err());
    }

    #[test]
    fn test_verify_node() {
        let tree = parse(LanguageId::Python, "def ok():\n    pass\n\ndef bad(:\n    pass\n");
        let engine = TraversalEngine::new();
        assert!(!engine.verify_node(&tree, tree.root()).unwrap());
        let first = tree.root_node().children().next().unwrap();
        assert_eq!(first.kind(), "function_definition");
        assert!(engine.verify_node(&tree, first.handle()).unwrap());
    }
}
