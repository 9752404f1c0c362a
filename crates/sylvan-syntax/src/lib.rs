//! Syntax trees, traversal, and pattern queries.
//!
//! A [`SyntaxTree`] owns the parsed source and a flattened copy of the
//! tree-sitter tree. Nodes are addressed by [`NodeHandle`], a small `Copy`
//! value carrying the id of the tree it came from, so a handle can be stored,
//! hashed, and compared without borrowing the tree. Handles from one tree are
//! rejected by every other tree.
//!
//! [`TraversalEngine`] walks trees without recursion; [`QueryHandler`] runs
//! the patterns of a [`PatternRegistry`](sylvan_patterns::PatternRegistry)
//! and groups captures into definitions.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sylvan_languages::{LanguageId, language_service};
//! use sylvan_patterns::PatternRegistry;
//! use sylvan_syntax::{QueryHandler, SyntaxTree};
//!
//! let service = language_service();
//! let tree = SyntaxTree::parse(&service, LanguageId::Python, "def f(x):\n    return x\n").unwrap();
//! let handler = QueryHandler::new(service, Arc::new(PatternRegistry::with_builtin()));
//! let functions = handler.find_functions(&tree, tree.root()).unwrap();
//! assert_eq!(functions.groups.len(), 1);
//! ```

mod error;
pub mod query;
pub mod traversal;
mod tree;

pub use error::{ParseError, QueryError, TraversalError};
pub use query::{
    Capture, CaptureGroup, CategoryMatches, DEFAULT_MATCH_LIMIT, QueryHandler, QueryResult,
    QuerySettings, QueryStats, group_captures,
};
pub use traversal::{NodeInfo, SearchLimits, TraversalEngine, Traverse};
pub use tree::{Children, NodeHandle, NodeRef, Position, SyntaxTree, TreeId};
