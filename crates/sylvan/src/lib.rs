//! Structural extraction for source files in many languages.
//!
//! [`Analyzer`] resolves a file's language, parses it with tree-sitter, runs
//! the registered patterns and returns a [`ParseResult`] with functions,
//! classes, imports and syntax-error sites.
//!
//! ```no_run
//! use sylvan::{Analyzer, LanguageId};
//!
//! let analyzer = Analyzer::new();
//! let result = analyzer
//!     .parse_content(b"class A:\n    def f(self):\n        pass\n", LanguageId::Python)
//!     .unwrap();
//! assert_eq!(result.metadata.class_names, ["A"]);
//! assert_eq!(result.functions[0].container.as_deref(), Some("A"));
//! ```
//!
//! Malformed input is never an error: it shows up in
//! [`ParseResult::error_nodes`]. An unknown language or missing grammar
//! gives a result with `is_supported == false`.

mod analyzer;
pub mod assembler;
pub mod config;
mod error;
mod result;

pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, GrammarConfig};
pub use error::Error;
pub use result::{
    Definition, IssueKind, Location, ParseMetadata, ParseResult, ParseStatus, SyntaxIssue,
};

pub use sylvan_languages::{LanguageFamily, LanguageId};
pub use sylvan_patterns::{PatternCategory, PatternRegistry};
pub use sylvan_syntax::{NodeHandle, Position, QuerySettings, SyntaxTree};
