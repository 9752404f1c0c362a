//! The normalized output of one analysis.

use serde::Serialize;
use std::ops::Range;
use sylvan_languages::LanguageId;
use sylvan_patterns::PatternCategory;
use sylvan_syntax::{NodeHandle, NodeRef, Position, SyntaxTree};

/// How far a file got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStatus {
    /// No tree: the language is unknown or its grammar is unavailable.
    Unparsed,
    ParsedOk,
    ParsedWithErrors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
    pub byte_range: Range<usize>,
}

impl Location {
    pub(crate) fn of(node: NodeRef<'_>) -> Self {
        Self {
            start: node.start(),
            end: node.end(),
            byte_range: node.byte_range(),
        }
    }
}

/// A function, class or import found in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    /// `None` for anonymous functions.
    pub name: Option<String>,
    /// Grammar node kind, e.g. `function_definition`.
    pub node_type: &'static str,
    pub location: Location,
    pub text: String,
    pub params: Option<String>,
    /// Name of the nearest enclosing class.
    pub container: Option<String>,
    #[serde(skip)]
    pub handle: NodeHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Text the grammar could not fit (an `ERROR` node).
    Error,
    /// A token synthesized by error recovery.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxIssue {
    pub line: usize,
    pub column: usize,
    pub node_type: &'static str,
    pub kind: IssueKind,
    #[serde(skip)]
    pub handle: NodeHandle,
}

/// Deterministic digest of a result.
///
/// Holds no timings, so identical input always produces an identical
/// digest and [`fingerprint`](Self::fingerprint).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseMetadata {
    pub function_names: Vec<String>,
    pub class_names: Vec<String>,
    pub import_names: Vec<String>,
    pub named_functions: usize,
    pub anonymous_functions: usize,
    pub has_errors: bool,
    pub has_missing: bool,
    pub error_locations: Vec<Position>,
    pub missing_locations: Vec<Position>,
    /// Categories the language has no pattern for.
    pub unsupported_categories: Vec<PatternCategory>,
    /// Categories whose query hit its match limit or time budget.
    pub truncated_categories: Vec<PatternCategory>,
    pub line_count: usize,
    /// blake3 hex digest of the other fields.
    pub fingerprint: String,
}

impl ParseMetadata {
    /// Fill [`fingerprint`](Self::fingerprint) from the remaining fields.
    pub(crate) fn seal(mut self) -> Self {
        self.fingerprint.clear();
        let bytes = serde_json::to_vec(&self).unwrap_or_default();
        self.fingerprint = blake3::hash(&bytes).to_hex().to_string();
        self
    }
}

/// Everything extracted from one file.
#[derive(Debug, Serialize)]
pub struct ParseResult {
    pub language: LanguageId,
    /// Known language, loaded grammar, and a tree free of syntax errors.
    pub is_supported: bool,
    /// A tree was built and every pattern ran.
    pub is_valid: bool,
    pub has_errors: bool,
    pub status: ParseStatus,
    pub node_count: usize,
    pub functions: Vec<Definition>,
    pub classes: Vec<Definition>,
    pub imports: Vec<Definition>,
    /// Every syntax-error site (`ERROR` and missing nodes) in document order.
    pub error_nodes: Vec<SyntaxIssue>,
    pub missing_nodes: Vec<SyntaxIssue>,
    pub metadata: ParseMetadata,
    /// Human-readable notes: why a file was not parsed, degraded patterns.
    pub errors: Vec<String>,
    pub parse_time_ms: f64,
    pub query_time_ms: f64,
    #[serde(skip)]
    pub tree: Option<SyntaxTree>,
}

impl ParseResult {
    /// Result for a file that produced no tree.
    pub fn unparsed(language: LanguageId, reason: impl Into<String>) -> Self {
        Self {
            language,
            is_supported: false,
            is_valid: false,
            has_errors: false,
            status: ParseStatus::Unparsed,
            node_count: 0,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            error_nodes: Vec::new(),
            missing_nodes: Vec::new(),
            metadata: ParseMetadata::default().seal(),
            errors: vec![reason.into()],
            parse_time_ms: 0.0,
            query_time_ms: 0.0,
            tree: None,
        }
    }

    pub fn function(&self, name: &str) -> Option<&Definition> {
        self.functions.iter().find(|d| d.name.as_deref() == Some(name))
    }

    pub fn class(&self, name: &str) -> Option<&Definition> {
        self.classes.iter().find(|d| d.name.as_deref() == Some(name))
    }
}
