use crate::TreeId;
use sylvan_languages::{LanguageError, LanguageId};
use sylvan_patterns::PatternCategory;

/// A node handle was used against the wrong tree or is out of range.
///
/// Always a caller bug; raised immediately rather than reading stale data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraversalError {
    #[error("node belongs to tree {found}, not tree {expected}")]
    ForeignNode { expected: TreeId, found: TreeId },
    #[error("node index {index} out of range for tree with {node_count} nodes")]
    InvalidNode { index: usize, node_count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The pattern text is not a valid query for the grammar.
    #[error("{category} pattern for {language} does not compile at {row}:{column}: {message}")]
    Compile {
        language: LanguageId,
        category: PatternCategory,
        row: usize,
        column: usize,
        message: String,
    },
    /// No pattern is registered for this category and language. Distinct
    /// from a pattern that ran and matched nothing.
    #[error("no {category} pattern for {language}")]
    Unsupported {
        category: PatternCategory,
        language: LanguageId,
    },
    #[error(transparent)]
    Language(#[from] LanguageError),
    #[error(transparent)]
    Traversal(#[from] TraversalError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Language(#[from] LanguageError),
    /// The parser gave up without producing a tree.
    #[error("parser for {0} produced no tree")]
    NoTree(LanguageId),
}
