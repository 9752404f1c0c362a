//! Pattern-driven extraction over a [`SyntaxTree`].

use crate::{NodeHandle, QueryError, SyntaxTree, TraversalError};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use streaming_iterator::StreamingIterator;
use sylvan_languages::{LanguageId, LanguageService};
use sylvan_patterns::{PatternCategory, PatternRegistry};
use tree_sitter::{Query, QueryCursor, QueryCursorOptions, QueryCursorState};

/// Default cap on matches returned by one execution.
pub const DEFAULT_MATCH_LIMIT: u32 = 1000;

/// Limits applied to one query execution.
///
/// Deserializes from the `[query]` table of a config file, with the time
/// budget given as `timeout_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuerySettings {
    /// Matches returned before the result is flagged truncated. Also bounds
    /// tree-sitter's table of in-progress matches.
    pub match_limit: u32,
    /// Wall-clock budget. Checked while the cursor walks the tree as well as
    /// between matches, so a query that matches nothing still stops in time.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Option<Duration>,
    /// Only start matches at most this deep below the query root.
    pub max_start_depth: Option<u32>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            match_limit: DEFAULT_MATCH_LIMIT,
            timeout: None,
            max_start_depth: None,
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

/// One captured node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capture {
    /// Capture name without the `@`, e.g. `function.name`.
    pub name: String,
    pub node: NodeHandle,
    pub pattern_index: usize,
    /// Which match of the execution produced this capture.
    pub match_id: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryStats {
    pub pattern_count: usize,
    pub capture_count: usize,
    pub match_count: usize,
    pub execution_time_ms: f64,
    /// The match limit or time budget cut the execution short.
    pub truncated: bool,
}

/// Raw outcome of one query execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub captures: Vec<Capture>,
    pub stats: QueryStats,
    /// The queried subtree parsed without errors.
    pub is_valid: bool,
    /// Non-fatal notes about the execution.
    pub errors: Vec<String>,
}

/// The captures of one definition, grouped by role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureGroup {
    pub definition: NodeHandle,
    pub name: Option<NodeHandle>,
    pub params: Option<NodeHandle>,
    pub body: Option<NodeHandle>,
    pub pattern_index: usize,
}

impl CaptureGroup {
    /// Whether a declared identifier was captured. Lambdas and arrow
    /// functions are anonymous.
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}

/// Grouped results for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMatches {
    pub category: PatternCategory,
    /// One group per definition, in document order.
    pub groups: Vec<CaptureGroup>,
    pub result: QueryResult,
}

impl CategoryMatches {
    pub fn definitions(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.groups.iter().map(|g| g.definition)
    }

    pub fn truncated(&self) -> bool {
        self.result.stats.truncated
    }
}

/// Resolves, compiles, caches and runs category patterns.
pub struct QueryHandler {
    languages: Arc<LanguageService>,
    registry: Arc<PatternRegistry>,
    settings: QuerySettings,
    category_settings: HashMap<PatternCategory, QuerySettings>,
    /// Compiled queries keyed by language and pattern text, so re-registering
    /// a category picks up the new text without invalidation.
    compiled: RwLock<HashMap<(LanguageId, Arc<str>), Arc<Query>>>,
}

impl QueryHandler {
    pub fn new(languages: Arc<LanguageService>, registry: Arc<PatternRegistry>) -> Self {
        Self {
            languages,
            registry,
            settings: QuerySettings::default(),
            category_settings: HashMap::new(),
            compiled: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Limits for one category, overriding the handler-wide settings.
    pub fn with_category_settings(mut self, category: PatternCategory, settings: QuerySettings) -> Self {
        self.category_settings.insert(category, settings);
        self
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    pub fn settings_for(&self, category: &PatternCategory) -> QuerySettings {
        self.category_settings
            .get(category)
            .copied()
            .unwrap_or(self.settings)
    }

    pub fn find_functions(&self, tree: &SyntaxTree, root: NodeHandle) -> Result<CategoryMatches, QueryError> {
        self.find_category(tree, root, PatternCategory::Function)
    }

    pub fn find_classes(&self, tree: &SyntaxTree, root: NodeHandle) -> Result<CategoryMatches, QueryError> {
        self.find_category(tree, root, PatternCategory::Class)
    }

    pub fn find_imports(&self, tree: &SyntaxTree, root: NodeHandle) -> Result<CategoryMatches, QueryError> {
        self.find_category(tree, root, PatternCategory::Import)
    }

    /// `ERROR` nodes below `root`, in document order.
    pub fn find_error_nodes(&self, tree: &SyntaxTree, root: NodeHandle) -> Result<CategoryMatches, QueryError> {
        self.find_category(tree, root, PatternCategory::Error)
    }

    /// Nodes inserted by error recovery below `root`, in document order.
    ///
    /// Missing nodes are flagged on the arena, so this is a linear scan of
    /// the subtree rather than a query.
    pub fn find_missing_nodes(
        &self,
        tree: &SyntaxTree,
        root: NodeHandle,
    ) -> Result<Vec<NodeHandle>, TraversalError> {
        tree.check(root)?;
        let start = root.index() as u32;
        let end = tree.subtree_end(start);
        let mut missing = Vec::new();
        for index in start..end {
            let node = tree.node(tree.handle(index))?;
            if node.is_missing() {
                missing.push(node.handle());
            }
        }
        Ok(missing)
    }

    /// Run the registered pattern for `category` from `root`.
    ///
    /// Fails with [`QueryError::Unsupported`] when the language has no
    /// pattern for the category, and [`QueryError::Compile`] when the
    /// pattern does not fit the grammar. Zero matches is a successful,
    /// empty result.
    pub fn find_category(
        &self,
        tree: &SyntaxTree,
        root: NodeHandle,
        category: PatternCategory,
    ) -> Result<CategoryMatches, QueryError> {
        let language = tree.language();
        let pattern = self
            .registry
            .pattern_for(&category, language)
            .ok_or_else(|| QueryError::Unsupported {
                category: category.clone(),
                language,
            })?;
        let query = self.compile(language, &category, &pattern)?;
        let settings = self.settings_for(&category);
        let result = self.execute(tree, &query, root, &settings)?;
        let groups = group_captures(&result.captures);

        tracing::debug!(
            language = %language,
            category = %category,
            matches = result.stats.match_count,
            groups = groups.len(),
            truncated = result.stats.truncated,
            duration_ms = result.stats.execution_time_ms,
            "query executed"
        );

        Ok(CategoryMatches {
            category,
            groups,
            result,
        })
    }

    /// Nodes of one kind below `root`, via an ad-hoc `(<kind>) @target` query.
    ///
    /// The query is compiled per call and not cached.
    pub fn find_nodes_by_type(
        &self,
        tree: &SyntaxTree,
        root: NodeHandle,
        kind: &str,
    ) -> Result<Vec<NodeHandle>, QueryError> {
        let text = format!("({kind}) @target");
        let query = self.build(tree.language(), &PatternCategory::from_name("target"), &text)?;
        let result = self.execute(tree, &query, root, &self.settings)?;
        let mut nodes: Vec<_> = result.captures.iter().map(|c| c.node).collect();
        nodes.sort();
        nodes.dedup();
        Ok(nodes)
    }

    /// Compile pattern text for a language, reusing a cached query when the
    /// same text was compiled before.
    pub fn compile(
        &self,
        language: LanguageId,
        category: &PatternCategory,
        text: &str,
    ) -> Result<Arc<Query>, QueryError> {
        let key = (language, Arc::<str>::from(text));
        if let Some(query) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(query));
        }

        let query = Arc::new(self.build(language, category, text)?);
        tracing::trace!(language = %language, category = %category, patterns = query.pattern_count(), "compiled query");

        self.compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&query));
        Ok(query)
    }

    fn build(&self, language: LanguageId, category: &PatternCategory, text: &str) -> Result<Query, QueryError> {
        let grammar = self.languages.get_language_object(language)?;
        Query::new(&grammar, text).map_err(|e| QueryError::Compile {
            language,
            category: category.clone(),
            row: e.row,
            column: e.column,
            message: e.message.clone(),
        })
    }

    /// Run a compiled query from `root` under `settings`.
    pub fn execute(
        &self,
        tree: &SyntaxTree,
        query: &Query,
        root: NodeHandle,
        settings: &QuerySettings,
    ) -> Result<QueryResult, QueryError> {
        let node = tree.ts_node(root)?;
        let started = Instant::now();
        let names = query.capture_names();
        let limit = settings.match_limit.max(1);

        let mut cursor = QueryCursor::new();
        cursor.set_match_limit(limit);
        if let Some(depth) = settings.max_start_depth {
            cursor.set_max_start_depth(Some(depth));
        }

        let deadline = settings.timeout.and_then(|budget| started.checked_add(budget));
        let timed_out = Cell::new(false);
        let mut on_progress = |_: &QueryCursorState| {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                timed_out.set(true);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let options = match deadline {
            Some(_) => QueryCursorOptions::new().progress_callback(&mut on_progress),
            None => QueryCursorOptions::new(),
        };

        let mut captures = Vec::new();
        let mut match_count = 0usize;
        let mut truncated = false;
        {
            let mut matches = cursor.matches_with_options(query, node, tree.source(), options);
            while let Some(m) = matches.next() {
                if match_count >= limit as usize {
                    truncated = true;
                    break;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    timed_out.set(true);
                    break;
                }
                for cap in m.captures {
                    let Some(handle) = tree.handle_for(cap.node) else {
                        continue;
                    };
                    captures.push(Capture {
                        name: names[cap.index as usize].to_string(),
                        node: handle,
                        pattern_index: m.pattern_index,
                        match_id: match_count,
                    });
                }
                match_count += 1;
            }
        }
        truncated |= timed_out.get();
        truncated |= cursor.did_exceed_match_limit();

        let mut errors = Vec::new();
        let is_valid = !tree.node(root)?.has_error();
        if !is_valid {
            errors.push("subtree contains syntax errors; matches may be partial".to_string());
        }
        if truncated {
            tracing::warn!(
                language = %tree.language(),
                match_limit = limit,
                matches = match_count,
                timed_out = timed_out.get(),
                "query truncated"
            );
            if timed_out.get() {
                errors.push(format!("time budget exceeded after {match_count} matches"));
            } else {
                errors.push(format!("truncated after {match_count} matches"));
            }
        }

        Ok(QueryResult {
            stats: QueryStats {
                pattern_count: query.pattern_count(),
                capture_count: captures.len(),
                match_count,
                execution_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                truncated,
            },
            captures,
            is_valid,
            errors,
        })
    }
}

/// Fold captures into one group per definition node.
///
/// Roles come from the capture-name suffix: `def`, `name` (or `module` for
/// imports), `params`, `body`. `_`-prefixed helper captures are skipped.
/// When several patterns match the same definition their roles are merged.
pub fn group_captures(captures: &[Capture]) -> Vec<CaptureGroup> {
    let mut by_match: BTreeMap<usize, Vec<&Capture>> = BTreeMap::new();
    for capture in captures {
        if !capture.name.starts_with('_') {
            by_match.entry(capture.match_id).or_default().push(capture);
        }
    }

    let mut groups: BTreeMap<NodeHandle, CaptureGroup> = BTreeMap::new();
    for members in by_match.values() {
        let role = |wanted: &[&str]| {
            members
                .iter()
                .find(|c| {
                    let suffix = c.name.rsplit_once('.').map_or(c.name.as_str(), |(_, r)| r);
                    wanted.contains(&suffix)
                })
                .map(|c| c.node)
        };
        let Some(definition) = role(&["def"]).or_else(|| members.first().map(|c| c.node)) else {
            continue;
        };
        let group = CaptureGroup {
            definition,
            name: role(&["name", "module"]),
            params: role(&["params"]),
            body: role(&["body"]),
            pattern_index: members[0].pattern_index,
        };
        match groups.get_mut(&definition) {
            Some(existing) => {
                existing.name = existing.name.or(group.name);
                existing.params = existing.params.or(group.params);
                existing.body = existing.body.or(group.body);
            }
            None => {
                groups.insert(definition, group);
            }
        }
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylvan_languages::language_service;

    fn handler() -> QueryHandler {
        QueryHandler::new(language_service(), Arc::new(PatternRegistry::with_builtin()))
    }

    fn parse(language: LanguageId, source: &str) -> SyntaxTree {
        SyntaxTree::parse(&language_service(), language, source).unwrap()
    }

    fn names(tree: &SyntaxTree, matches: &CategoryMatches) -> Vec<String> {
        matches
            .groups
            .iter()
            .filter_map(|g| g.name)
            .map(|h| tree.node(h).unwrap().text().into_owned())
            .collect()
    }

    #[test]
    fn test_python_functions_and_classes() {
        let tree = parse(
            LanguageId::Python,
            "class Greeter:\n    def hello(self):\n        pass\n\n    def bye(self):\n        pass\n",
        );
        let handler = handler();
        let functions = handler.find_functions(&tree, tree.root()).unwrap();
        assert_eq!(names(&tree, &functions), ["hello", "bye"]);
        assert!(functions.groups.iter().all(|g| g.is_named() && g.params.is_some()));

        let classes = handler.find_classes(&tree, tree.root()).unwrap();
        assert_eq!(names(&tree, &classes), ["Greeter"]);
    }

    #[test]
    fn test_anonymous_functions() {
        let tree = parse(LanguageId::JavaScript, "const f = (x) => x * 2;\nfunction g() {}\n");
        let functions = handler().find_functions(&tree, tree.root()).unwrap();
        assert_eq!(functions.groups.len(), 2);
        assert!(!functions.groups[0].is_named());
        assert_eq!(names(&tree, &functions), ["g"]);
    }

    #[test]
    fn test_named_function_expression_is_grouped_once() {
        let tree = parse(LanguageId::JavaScript, "const f = function inner(a) { return a; };\n");
        let functions = handler().find_functions(&tree, tree.root()).unwrap();
        assert_eq!(functions.groups.len(), 1);
        assert_eq!(names(&tree, &functions), ["inner"]);
    }

    #[test]
    fn test_imports() {
        let tree = parse(
            LanguageId::Python,
            "import os\nimport numpy as np\nfrom collections import OrderedDict\n",
        );
        let imports = handler().find_imports(&tree, tree.root()).unwrap();
        assert_eq!(names(&tree, &imports), ["os", "numpy", "collections"]);
    }

    #[test]
    fn test_unsupported_category_is_distinct_from_empty() {
        let handler = handler();
        let json = parse(LanguageId::Json, "{\"a\": 1}");
        assert_eq!(
            handler.find_functions(&json, json.root()).unwrap_err(),
            QueryError::Unsupported {
                category: PatternCategory::Function,
                language: LanguageId::Json
            }
        );

        let empty = parse(LanguageId::Python, "x = 1\n");
        let functions = handler.find_functions(&empty, empty.root()).unwrap();
        assert!(functions.groups.is_empty());
        assert!(functions.result.is_valid);
    }

    #[test]
    fn test_compile_error_reports_position() {
        let handler = handler();
        let err = handler
            .compile(LanguageId::Python, &PatternCategory::Function, "(no_such_node) @function.def")
            .unwrap_err();
        match err {
            QueryError::Compile { language, row, .. } => {
                assert_eq!(language, LanguageId::Python);
                assert_eq!(row, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_compiled_queries_are_cached() {
        let handler = handler();
        let a = handler
            .compile(LanguageId::Python, &PatternCategory::Function, "(identifier) @function.def")
            .unwrap();
        let b = handler
            .compile(LanguageId::Python, &PatternCategory::Function, "(identifier) @function.def")
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_registration_is_seen_by_next_query() {
        let handler = handler();
        let tree = parse(LanguageId::Python, "@cached\ndef f():\n    pass\n");
        assert!(handler.find_category(&tree, tree.root(), PatternCategory::from_name("wrapped")).is_err());

        handler.registry().register_language_pattern(
            LanguageId::Python,
            PatternCategory::from_name("wrapped"),
            "(decorated_definition definition: (function_definition name: (identifier) @wrapped.name)) @wrapped.def",
        );
        let wrapped = handler
            .find_category(&tree, tree.root(), PatternCategory::from_name("wrapped"))
            .unwrap();
        assert_eq!(names(&tree, &wrapped), ["f"]);
    }

    #[test]
    fn test_match_limit_truncates() {
        let source: String = (0..20).map(|i| format!("def f{i}():\n    pass\n")).collect();
        let tree = parse(LanguageId::Python, &source);
        let handler = handler().with_category_settings(
            PatternCategory::Function,
            QuerySettings {
                match_limit: 5,
                ..QuerySettings::default()
            },
        );
        let functions = handler.find_functions(&tree, tree.root()).unwrap();
        assert!(functions.truncated());
        assert_eq!(functions.groups.len(), 5);
        assert_eq!(functions.result.stats.match_count, 5);
        assert!(!functions.result.errors.is_empty());

        // Other categories keep the default limit.
        assert_eq!(handler.settings_for(&PatternCategory::Class).match_limit, DEFAULT_MATCH_LIMIT);
    }

    #[test]
    fn test_time_budget_stops_query_without_matches() {
        let source: String = (0..50_000).map(|i| format!("x{i} = {i}\n")).collect();
        let tree = parse(LanguageId::Python, &source);

        let unbounded = handler().find_functions(&tree, tree.root()).unwrap();
        assert!(unbounded.groups.is_empty());
        assert!(!unbounded.truncated());

        let handler = handler().with_settings(QuerySettings {
            timeout: Some(Duration::ZERO),
            ..QuerySettings::default()
        });
        let functions = handler.find_functions(&tree, tree.root()).unwrap();
        assert!(functions.truncated());
        assert_eq!(functions.result.stats.match_count, 0);
        assert!(functions.result.errors.iter().any(|e| e.contains("time budget")));
    }

    #[test]
    fn test_errors_and_missing_nodes() {
        let tree = parse(LanguageId::JavaScript, "function greet(name) {\n  console.log(\"hello\", name;\n}\n");
        let handler = handler();
        let errors = handler.find_error_nodes(&tree, tree.root()).unwrap();
        let missing = handler.find_missing_nodes(&tree, tree.root()).unwrap();
        assert!(!errors.groups.is_empty() || !missing.is_empty());

        let clean = parse(LanguageId::JavaScript, "function ok() {}\n");
        assert!(handler.find_error_nodes(&clean, clean.root()).unwrap().groups.is_empty());
        assert!(handler.find_missing_nodes(&clean, clean.root()).unwrap().is_empty());
    }

    #[test]
    fn test_find_nodes_by_type() {
        let tree = parse(LanguageId::Rust, "fn a() {}\nfn b() { let c = || 1; }\n");
        let handler = handler();
        let items = handler.find_nodes_by_type(&tree, tree.root(), "function_item").unwrap();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            handler.find_nodes_by_type(&tree, tree.root(), "not_a_kind"),
            Err(QueryError::Compile { .. })
        ));
    }

    #[test]
    fn test_node_type_lookups_leave_cache_alone() {
        let tree = parse(LanguageId::Rust, "fn a() { let b = 1; }\n");
        let handler = handler();
        handler.find_functions(&tree, tree.root()).unwrap();
        let cached = handler.compiled.read().unwrap().len();
        for kind in ["function_item", "let_declaration", "integer_literal", "identifier"] {
            assert!(!handler.find_nodes_by_type(&tree, tree.root(), kind).unwrap().is_empty());
        }
        assert_eq!(handler.compiled.read().unwrap().len(), cached);
    }

    #[test]
    fn test_query_from_subtree_root() {
        let tree = parse(LanguageId::Python, "def a():\n    def inner():\n        pass\n\ndef b():\n    pass\n");
        let handler = handler();
        let first = tree.root_node().children().next().unwrap().handle();
        let functions = handler.find_functions(&tree, first).unwrap();
        assert_eq!(names(&tree, &functions), ["a", "inner"]);
    }
}
