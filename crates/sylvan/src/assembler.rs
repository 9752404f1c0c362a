//! Turns source text into a [`ParseResult`].
//!
//! The pipeline is a typestate: [`Unparsed::parse`] consumes the input and
//! yields [`Parsed`], and [`Parsed::analyze`] consumes that and yields the
//! final result. There is no way back to an earlier stage.

use crate::result::{
    Definition, IssueKind, Location, ParseMetadata, ParseResult, ParseStatus, SyntaxIssue,
};
use std::collections::HashMap;
use std::time::Instant;
use sylvan_languages::{LanguageId, LanguageService};
use sylvan_patterns::PatternCategory;
use sylvan_syntax::{
    CategoryMatches, NodeHandle, ParseError, Position, QueryError, QueryHandler, SyntaxTree,
};

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Source waiting to be parsed.
pub struct Unparsed<'a> {
    language: LanguageId,
    source: &'a [u8],
}

impl<'a> Unparsed<'a> {
    pub fn new(language: LanguageId, source: &'a [u8]) -> Self {
        Self { language, source }
    }

    pub fn parse(self, languages: &LanguageService) -> Result<Parsed, ParseError> {
        let started = Instant::now();
        let tree = SyntaxTree::parse(languages, self.language, self.source)?;
        let status = if tree.has_error() {
            ParseStatus::ParsedWithErrors
        } else {
            ParseStatus::ParsedOk
        };
        tracing::trace!(language = %self.language, ?status, nodes = tree.node_count(), "parsed");
        Ok(Parsed {
            tree,
            status,
            parse_time_ms: elapsed_ms(started),
        })
    }
}

/// A tree, not yet queried.
pub struct Parsed {
    tree: SyntaxTree,
    status: ParseStatus,
    parse_time_ms: f64,
}

impl Parsed {
    pub fn status(&self) -> ParseStatus {
        self.status
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Run every extraction and assemble the result.
    ///
    /// A category the language has no pattern for is recorded in
    /// `metadata.unsupported_categories`. A pattern that fails to compile is
    /// an error when `strict`; otherwise it is logged, noted in
    /// `errors`, and treated as matching nothing.
    pub fn analyze(self, handler: &QueryHandler, strict: bool) -> Result<ParseResult, QueryError> {
        let started = Instant::now();
        let tree = &self.tree;
        let root = tree.root();
        let mut run = Runs {
            handler,
            tree,
            strict,
            diagnostics: Vec::new(),
            unsupported: Vec::new(),
            truncated: Vec::new(),
            degraded: false,
        };

        let classes = run.category(PatternCategory::Class)?;
        let functions = run.category(PatternCategory::Function)?;
        let imports = run.category(PatternCategory::Import)?;
        let errors = run.category(PatternCategory::Error)?;
        let missing = handler.find_missing_nodes(tree, root)?;

        // Class definition node -> class name, for container lookup.
        let class_names: HashMap<NodeHandle, String> = classes
            .iter()
            .flat_map(|m| &m.groups)
            .filter_map(|g| Some((g.definition, text_of(tree, g.name?)?)))
            .collect();

        let classes = definitions(tree, classes.as_ref(), &class_names)?;
        let functions = definitions(tree, functions.as_ref(), &class_names)?;
        let imports = definitions(tree, imports.as_ref(), &class_names)?;

        let missing_nodes = issues(tree, missing, IssueKind::Missing)?;
        let error_sites: Vec<NodeHandle> = errors
            .as_ref()
            .map(|m| m.definitions().collect())
            .unwrap_or_default();
        let mut error_nodes = issues(tree, error_sites, IssueKind::Error)?;
        error_nodes.extend(missing_nodes.iter().cloned());
        error_nodes.sort_by_key(|issue| issue.handle);

        let has_errors = tree.has_error();
        let named_functions = functions.iter().filter(|f| f.name.is_some()).count();
        let metadata = ParseMetadata {
            function_names: functions.iter().filter_map(|d| d.name.clone()).collect(),
            class_names: classes.iter().filter_map(|d| d.name.clone()).collect(),
            import_names: imports.iter().filter_map(|d| d.name.clone()).collect(),
            named_functions,
            anonymous_functions: functions.len() - named_functions,
            has_errors,
            has_missing: !missing_nodes.is_empty(),
            error_locations: error_nodes.iter().map(issue_position).collect(),
            missing_locations: missing_nodes.iter().map(issue_position).collect(),
            unsupported_categories: run.unsupported,
            truncated_categories: run.truncated,
            line_count: String::from_utf8_lossy(tree.source()).lines().count(),
            fingerprint: String::new(),
        }
        .seal();

        let query_time_ms = elapsed_ms(started);
        tracing::debug!(
            language = %tree.language(),
            functions = functions.len(),
            classes = classes.len(),
            imports = imports.len(),
            errors = error_nodes.len(),
            duration_ms = query_time_ms,
            "analyzed"
        );

        Ok(ParseResult {
            language: tree.language(),
            is_supported: !has_errors,
            is_valid: !run.degraded,
            has_errors,
            status: self.status,
            node_count: tree.node_count(),
            functions,
            classes,
            imports,
            error_nodes,
            missing_nodes,
            metadata,
            errors: run.diagnostics,
            parse_time_ms: self.parse_time_ms,
            query_time_ms,
            tree: Some(self.tree),
        })
    }
}

/// Bookkeeping for the category queries of one analysis.
struct Runs<'a> {
    handler: &'a QueryHandler,
    tree: &'a SyntaxTree,
    strict: bool,
    diagnostics: Vec<String>,
    unsupported: Vec<PatternCategory>,
    truncated: Vec<PatternCategory>,
    degraded: bool,
}

impl Runs<'_> {
    fn category(&mut self, category: PatternCategory) -> Result<Option<CategoryMatches>, QueryError> {
        match self.handler.find_category(self.tree, self.tree.root(), category.clone()) {
            Ok(matches) => {
                if matches.truncated() {
                    self.diagnostics.push(format!("{category} results truncated"));
                    self.truncated.push(category);
                }
                Ok(Some(matches))
            }
            Err(QueryError::Unsupported { .. }) => {
                self.unsupported.push(category);
                Ok(None)
            }
            Err(e @ QueryError::Compile { .. }) if !self.strict => {
                tracing::warn!(language = %self.tree.language(), category = %category, error = %e, "skipping pattern");
                self.diagnostics.push(e.to_string());
                self.degraded = true;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

fn text_of(tree: &SyntaxTree, handle: NodeHandle) -> Option<String> {
    tree.node(handle).ok().map(|n| n.text().into_owned())
}

fn definitions(
    tree: &SyntaxTree,
    matches: Option<&CategoryMatches>,
    class_names: &HashMap<NodeHandle, String>,
) -> Result<Vec<Definition>, QueryError> {
    let Some(matches) = matches else {
        return Ok(Vec::new());
    };
    let mut out = Vec::with_capacity(matches.groups.len());
    for group in &matches.groups {
        let node = tree.node(group.definition)?;
        let mut container = None;
        let mut ancestor = node.parent();
        while let Some(a) = ancestor {
            if let Some(name) = class_names.get(&a.handle()) {
                container = Some(name.clone());
                break;
            }
            ancestor = a.parent();
        }
        out.push(Definition {
            name: group.name.and_then(|h| text_of(tree, h)),
            node_type: node.kind(),
            location: Location::of(node),
            text: node.text().into_owned(),
            params: group.params.and_then(|h| text_of(tree, h)),
            container,
            handle: group.definition,
        });
    }
    Ok(out)
}

fn issues(
    tree: &SyntaxTree,
    handles: Vec<NodeHandle>,
    kind: IssueKind,
) -> Result<Vec<SyntaxIssue>, QueryError> {
    handles
        .into_iter()
        .map(|handle| {
            let node = tree.node(handle)?;
            let start = node.start();
            Ok(SyntaxIssue {
                line: start.line,
                column: start.column,
                node_type: node.kind(),
                kind,
                handle,
            })
        })
        .collect()
}

fn issue_position(issue: &SyntaxIssue) -> Position {
    Position {
        line: issue.line,
        column: issue.column,
    }
}
