//! Parsed trees flattened into an index arena.
//!
//! A [`SyntaxTree`] owns the tree-sitter tree, the source bytes, and a
//! pre-order array of node records. Nodes are addressed by [`NodeHandle`]
//! (tree id + index). Tree ids come from a process-wide counter and are
//! never reused, so a handle can only ever resolve against the tree that
//! produced it.

use crate::{ParseError, TraversalError};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use sylvan_languages::{LanguageId, LanguageService};
use tree_sitter::{Node, Parser, Point, Tree};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TreeId(u64);

impl TreeId {
    fn next() -> Self {
        TreeId(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Address of one node in one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeHandle {
    tree: TreeId,
    index: u32,
}

impl NodeHandle {
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    /// Pre-order position within the tree.
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Source position: 1-based line, 0-based byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl From<Point> for Position {
    fn from(p: Point) -> Self {
        Position {
            line: p.row + 1,
            column: p.column,
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: &'static str,
    byte_range: Range<usize>,
    start: Point,
    end: Point,
    parent: Option<u32>,
    first_child: Option<u32>,
    next_sibling: Option<u32>,
    prev_sibling: Option<u32>,
    /// Position among the parent's children (named and anonymous).
    child_index: u32,
    child_count: u32,
    named_child_count: u32,
    depth: u32,
    is_named: bool,
    is_error: bool,
    is_missing: bool,
    has_error: bool,
}

/// An immutable parsed snapshot of one source text.
pub struct SyntaxTree {
    id: TreeId,
    language: LanguageId,
    source: Vec<u8>,
    tree: Tree,
    nodes: Vec<NodeData>,
    /// tree-sitter node id → arena index.
    by_ts_id: HashMap<usize, u32>,
}

impl SyntaxTree {
    /// Parse `source` with the grammar the service binds to `language`.
    pub fn parse(
        service: &LanguageService,
        language: LanguageId,
        source: impl Into<Vec<u8>>,
    ) -> Result<Self, ParseError> {
        let mut parser = service.get_parser(language)?;
        Self::parse_with(&mut parser, language, source)
    }

    /// Parse with an already configured parser.
    pub fn parse_with(
        parser: &mut Parser,
        language: LanguageId,
        source: impl Into<Vec<u8>>,
    ) -> Result<Self, ParseError> {
        let source = source.into();
        let tree = parser
            .parse(&source, None)
            .ok_or(ParseError::NoTree(language))?;
        Ok(Self::from_tree(language, source, tree))
    }

    /// Wrap a tree-sitter tree. `source` must be the text it was parsed from.
    pub fn from_tree(language: LanguageId, source: Vec<u8>, tree: Tree) -> Self {
        let (nodes, by_ts_id) = flatten(&tree);
        let id = TreeId::next();
        tracing::trace!(tree = %id, language = %language, nodes = nodes.len(), "built syntax tree");
        Self {
            id,
            language,
            source,
            tree,
            nodes,
            by_ts_id,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// The underlying tree-sitter tree.
    pub fn ts_tree(&self) -> &Tree {
        &self.tree
    }

    /// Number of nodes, named and anonymous.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> NodeHandle {
        NodeHandle {
            tree: self.id,
            index: 0,
        }
    }

    /// Whether any node in the tree is an error or missing node.
    pub fn has_error(&self) -> bool {
        self.nodes[0].has_error
    }

    /// Resolve a handle against this tree.
    pub fn node(&self, handle: NodeHandle) -> Result<NodeRef<'_>, TraversalError> {
        self.check(handle)?;
        Ok(NodeRef {
            tree: self,
            index: handle.index,
        })
    }

    pub fn root_node(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            index: 0,
        }
    }

    /// Validate that a handle belongs to this tree and is in range.
    pub fn check(&self, handle: NodeHandle) -> Result<(), TraversalError> {
        if handle.tree != self.id {
            return Err(TraversalError::ForeignNode {
                expected: self.id,
                found: handle.tree,
            });
        }
        if handle.index as usize >= self.nodes.len() {
            return Err(TraversalError::InvalidNode {
                index: handle.index as usize,
                node_count: self.nodes.len(),
            });
        }
        Ok(())
    }

    /// Map a tree-sitter node from this tree back to its handle.
    pub fn handle_for(&self, node: Node<'_>) -> Option<NodeHandle> {
        self.by_ts_id.get(&node.id()).map(|index| NodeHandle {
            tree: self.id,
            index: *index,
        })
    }

    /// The tree-sitter node behind a handle.
    pub fn ts_node(&self, handle: NodeHandle) -> Result<Node<'_>, TraversalError> {
        self.check(handle)?;
        let mut path = Vec::with_capacity(self.nodes[handle.index as usize].depth as usize);
        let mut current = handle.index;
        while let Some(parent) = self.nodes[current as usize].parent {
            path.push(self.nodes[current as usize].child_index);
            current = parent;
        }
        let mut node = self.tree.root_node();
        for child_index in path.into_iter().rev() {
            node = node.child(child_index).ok_or(TraversalError::InvalidNode {
                index: handle.index as usize,
                node_count: self.nodes.len(),
            })?;
        }
        Ok(node)
    }

    pub(crate) fn handle(&self, index: u32) -> NodeHandle {
        NodeHandle {
            tree: self.id,
            index,
        }
    }

    pub(crate) fn parent_index(&self, index: u32) -> Option<u32> {
        self.nodes[index as usize].parent
    }

    pub(crate) fn first_child_index(&self, index: u32) -> Option<u32> {
        self.nodes[index as usize].first_child
    }

    pub(crate) fn next_sibling_index(&self, index: u32) -> Option<u32> {
        self.nodes[index as usize].next_sibling
    }

    /// Exclusive end of the pre-order range covering `index`'s subtree.
    pub(crate) fn subtree_end(&self, index: u32) -> u32 {
        let mut current = index;
        loop {
            let data = &self.nodes[current as usize];
            if let Some(next) = data.next_sibling {
                return next;
            }
            match data.parent {
                Some(parent) => current = parent,
                None => return self.nodes.len() as u32,
            }
        }
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("id", &self.id)
            .field("language", &self.language)
            .field("node_count", &self.nodes.len())
            .field("source_len", &self.source.len())
            .finish()
    }
}

/// Borrowed view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    index: u32,
}

impl<'t> NodeRef<'t> {
    fn data(&self) -> &'t NodeData {
        &self.tree.nodes[self.index as usize]
    }

    fn at(&self, index: u32) -> NodeRef<'t> {
        NodeRef {
            tree: self.tree,
            index,
        }
    }

    pub fn handle(&self) -> NodeHandle {
        self.tree.handle(self.index)
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    /// Grammar node type, e.g. `function_definition` or `(`.
    pub fn kind(&self) -> &'static str {
        self.data().kind
    }

    pub fn text(&self) -> Cow<'t, str> {
        String::from_utf8_lossy(&self.tree.source[self.data().byte_range.clone()])
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.data().byte_range.clone()
    }

    pub fn start(&self) -> Position {
        self.data().start.into()
    }

    pub fn end(&self) -> Position {
        self.data().end.into()
    }

    pub fn start_point(&self) -> Point {
        self.data().start
    }

    pub fn end_point(&self) -> Point {
        self.data().end
    }

    /// Distance from the root; the root is 0.
    pub fn depth(&self) -> usize {
        self.data().depth as usize
    }

    pub fn is_named(&self) -> bool {
        self.data().is_named
    }

    /// An `ERROR` node: input the grammar could not fit.
    pub fn is_error(&self) -> bool {
        self.data().is_error
    }

    /// A zero-width node the parser inserted during error recovery.
    pub fn is_missing(&self) -> bool {
        self.data().is_missing
    }

    /// Whether this node or any descendant is an error or missing node.
    pub fn has_error(&self) -> bool {
        self.data().has_error
    }

    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.data().parent.map(|p| self.at(p))
    }

    pub fn child_count(&self) -> usize {
        self.data().child_count as usize
    }

    pub fn named_child_count(&self) -> usize {
        self.data().named_child_count as usize
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'t>> {
        self.data().next_sibling.map(|i| self.at(i))
    }

    pub fn prev_sibling(&self) -> Option<NodeRef<'t>> {
        self.data().prev_sibling.map(|i| self.at(i))
    }

    pub fn children(&self) -> Children<'t> {
        Children {
            tree: self.tree,
            next: self.data().first_child,
        }
    }

    pub fn named_children(&self) -> impl Iterator<Item = NodeRef<'t>> + 't {
        self.children().filter(|c| c.is_named())
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.start();
        let end = self.end();
        write!(
            f,
            "{} [{}:{} - {}:{}]",
            self.kind(),
            start.line,
            start.column,
            end.line,
            end.column
        )
    }
}

/// Iterator over a node's direct children, in order.
pub struct Children<'t> {
    tree: &'t SyntaxTree,
    next: Option<u32>,
}

impl<'t> Iterator for Children<'t> {
    type Item = NodeRef<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        self.next = self.tree.nodes[index as usize].next_sibling;
        Some(NodeRef {
            tree: self.tree,
            index,
        })
    }
}

/// Pre-order flattening with a tree cursor; never recurses.
fn flatten(tree: &Tree) -> (Vec<NodeData>, HashMap<usize, u32>) {
    let mut nodes: Vec<NodeData> = Vec::new();
    let mut by_ts_id = HashMap::new();
    let mut cursor = tree.walk();
    // Open ancestors: (arena index, last child pushed so far).
    let mut open: Vec<(u32, Option<u32>)> = Vec::new();

    'walk: loop {
        let node = cursor.node();
        let index = nodes.len() as u32;
        let parent = open.last().map(|(p, _)| *p);
        let prev_sibling = open.last().and_then(|(_, last)| *last);
        let child_index = parent.map_or(0, |p| nodes[p as usize].child_count);

        nodes.push(NodeData {
            kind: node.kind(),
            byte_range: node.byte_range(),
            start: node.start_position(),
            end: node.end_position(),
            parent,
            first_child: None,
            next_sibling: None,
            prev_sibling,
            child_index,
            child_count: 0,
            named_child_count: 0,
            depth: open.len() as u32,
            is_named: node.is_named(),
            is_error: node.is_error(),
            is_missing: node.is_missing(),
            has_error: node.has_error(),
        });
        by_ts_id.insert(node.id(), index);

        if let Some((p, last)) = open.last_mut() {
            let p = *p as usize;
            nodes[p].child_count += 1;
            if node.is_named() {
                nodes[p].named_child_count += 1;
            }
            if nodes[p].first_child.is_none() {
                nodes[p].first_child = Some(index);
            }
            if let Some(prev) = *last {
                nodes[prev as usize].next_sibling = Some(index);
            }
            *last = Some(index);
        }

        if cursor.goto_first_child() {
            open.push((index, None));
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                continue 'walk;
            }
            if !cursor.goto_parent() {
                break 'walk;
            }
            open.pop();
        }
    }

    (nodes, by_ts_id)
}
